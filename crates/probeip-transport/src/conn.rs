//! Connected datagram transport abstraction.
//!
//! A [`DatagramConn`] is already connected to a single remote endpoint, so reads
//! and writes carry no address. Every operation is bounded by the deadline most
//! recently installed with [`DatagramConn::set_deadline`]; the deadline is an
//! absolute instant and keeps applying until it is replaced.

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::time::Instant;

/// Transport layer errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O error from the underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The installed deadline elapsed before the operation completed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Dialing the remote endpoint failed
    #[error("failed to dial {endpoint}: {source}")]
    DialFailed {
        /// Destination that could not be dialed
        endpoint: SocketAddr,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Whether this error only signals that the current deadline elapsed.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Async connected datagram transport.
///
/// # Examples
///
/// ```no_run
/// use probeip_transport::{DatagramConn, TokioNetwork, UnderlyingNetwork};
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let network = TokioNetwork::new();
/// let mut conn = network.dial_udp("192.0.2.10:3478".parse()?).await?;
///
/// conn.set_deadline(Instant::now() + Duration::from_millis(500))?;
/// conn.write(b"ping").await?;
///
/// let mut buf = vec![0u8; 1500];
/// let size = conn.read(&mut buf).await?;
/// println!("Received {} bytes", size);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DatagramConn: Send + Sync {
    /// Install the deadline bounding subsequent reads and writes.
    ///
    /// # Errors
    /// Returns `TransportError` if the underlying socket rejects the deadline
    fn set_deadline(&mut self, deadline: Instant) -> TransportResult<()>;

    /// Send one datagram to the connected peer.
    ///
    /// # Errors
    /// Returns `TransportError::DeadlineExceeded` if the deadline elapses first,
    /// or the socket error otherwise
    async fn write(&mut self, buf: &[u8]) -> TransportResult<usize>;

    /// Receive one datagram from the connected peer into `buf`.
    ///
    /// # Errors
    /// Returns `TransportError::DeadlineExceeded` if the deadline elapses first,
    /// or the socket error otherwise
    async fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize>;

    /// Local address the transport is bound to.
    ///
    /// # Errors
    /// Returns `TransportError` if the address cannot be determined
    fn local_addr(&self) -> TransportResult<SocketAddr>;

    /// Remote address the transport is connected to.
    ///
    /// # Errors
    /// Returns `TransportError` if the address cannot be determined
    fn peer_addr(&self) -> TransportResult<SocketAddr>;
}

/// Run `op` under an optional absolute deadline.
///
/// An already-elapsed deadline fails without polling `op`.
pub(crate) async fn with_deadline<T, F>(deadline: Option<Instant>, op: F) -> TransportResult<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(TransportError::DeadlineExceeded),
        Some(deadline) => tokio::time::timeout_at(deadline, op)
            .await
            .map_err(|_| TransportError::DeadlineExceeded)?
            .map_err(TransportError::Io),
        None => op.await.map_err(TransportError::Io),
    }
}
