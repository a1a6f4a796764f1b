//! Connected UDP transport.
//!
//! This module provides the tokio implementation of [`DatagramConn`] returned by
//! [`TokioNetwork::dial_udp`](crate::TokioNetwork).

use crate::conn::{DatagramConn, TransportError, TransportResult, with_deadline};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// UDP socket connected to one remote endpoint.
///
/// The socket is closed when the value is dropped.
#[derive(Debug)]
pub struct UdpConn {
    socket: UdpSocket,
    peer: SocketAddr,
    deadline: Option<Instant>,
}

impl UdpConn {
    /// Bind an ephemeral local socket of the peer's address family and connect it.
    ///
    /// # Errors
    /// Returns `TransportError::DialFailed` if the socket cannot be created,
    /// bound or connected
    pub async fn connect(peer: SocketAddr) -> TransportResult<Self> {
        let dial_failed = |source| TransportError::DialFailed {
            endpoint: peer,
            source,
        };

        // Create socket using socket2 so the local address family follows the peer
        let (domain, local): (socket2::Domain, SocketAddr) = if peer.is_ipv4() {
            (socket2::Domain::IPV4, (Ipv4Addr::UNSPECIFIED, 0).into())
        } else {
            (socket2::Domain::IPV6, (Ipv6Addr::UNSPECIFIED, 0).into())
        };

        let socket2 =
            socket2::Socket::new(domain, socket2::Type::DGRAM, Some(socket2::Protocol::UDP))
                .map_err(dial_failed)?;
        if peer.is_ipv6() {
            socket2.set_only_v6(true).map_err(dial_failed)?;
        }
        socket2.bind(&local.into()).map_err(dial_failed)?;

        // Convert to std socket, then to tokio socket
        socket2.set_nonblocking(true).map_err(dial_failed)?;
        let std_socket: std::net::UdpSocket = socket2.into();
        let socket = UdpSocket::from_std(std_socket).map_err(dial_failed)?;
        socket.connect(peer).await.map_err(dial_failed)?;

        tracing::trace!(%peer, local = ?socket.local_addr().ok(), "udp transport connected");

        Ok(Self {
            socket,
            peer,
            deadline: None,
        })
    }
}

#[async_trait]
impl DatagramConn for UdpConn {
    fn set_deadline(&mut self, deadline: Instant) -> TransportResult<()> {
        self.deadline = Some(deadline);
        Ok(())
    }

    async fn write(&mut self, buf: &[u8]) -> TransportResult<usize> {
        with_deadline(self.deadline, self.socket.send(buf)).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        with_deadline(self.deadline, self.socket.recv(buf)).await
    }

    fn local_addr(&self) -> TransportResult<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    fn peer_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.peer)
    }
}
