//! Underlying network facility.
//!
//! The [`UnderlyingNetwork`] is the one place where sockets are created and
//! where the operating system's `getaddrinfo` is consulted. Lookup clients share
//! a single instance across all concurrent candidate tasks.

use crate::conn::{DatagramConn, TransportResult};
use crate::resolver::{DnsError, DnsResult};
use crate::udp::UdpConn;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Dialing and system-resolver facility.
#[async_trait]
pub trait UnderlyingNetwork: Send + Sync {
    /// Open a datagram transport connected to `endpoint`.
    ///
    /// No name resolution happens here: the destination is already a literal address.
    ///
    /// # Errors
    /// Returns `TransportError::DialFailed` if the transport cannot be created
    async fn dial_udp(&self, endpoint: SocketAddr) -> TransportResult<Box<dyn DatagramConn>>;

    /// Resolve `domain` with the system resolver, asking for any address family.
    ///
    /// Returns literal IP address strings in resolver order.
    ///
    /// # Errors
    /// Returns `DnsError::Lookup` if the system resolver fails
    async fn getaddrinfo_lookup_any(&self, domain: &str) -> DnsResult<Vec<String>>;
}

/// Production network backed by tokio sockets and the system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioNetwork;

impl TokioNetwork {
    /// Create a new tokio-backed network.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UnderlyingNetwork for TokioNetwork {
    async fn dial_udp(&self, endpoint: SocketAddr) -> TransportResult<Box<dyn DatagramConn>> {
        let conn = UdpConn::connect(endpoint).await?;
        Ok(Box::new(conn))
    }

    async fn getaddrinfo_lookup_any(&self, domain: &str) -> DnsResult<Vec<String>> {
        // The port is irrelevant: only the addresses are reported
        let resolved = tokio::net::lookup_host((domain, 0))
            .await
            .map_err(|source| DnsError::Lookup {
                domain: domain.to_string(),
                source,
            })?;

        let mut addrs: Vec<String> = Vec::new();
        for addr in resolved {
            let ip = addr.ip().to_string();
            if !addrs.contains(&ip) {
                addrs.push(ip);
            }
        }

        tracing::debug!(domain, ?addrs, "getaddrinfo lookup complete");
        Ok(addrs)
    }
}
