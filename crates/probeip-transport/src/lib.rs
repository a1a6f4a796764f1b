//! # probeip Transport
//!
//! Network collaborators consumed by the probeip lookup clients.
//!
//! This crate provides:
//! - [`DatagramConn`]: a connected datagram transport with absolute read/write deadlines
//! - [`UnderlyingNetwork`]: the dialing and system-resolver facility
//! - [`Resolver`]: a name resolver returning literal IP address strings
//! - Tokio-backed production implementations ([`TokioNetwork`], [`UdpConn`], [`SystemResolver`])
//!
//! The traits are object safe so that lookup clients can hold them behind `Arc<dyn ...>`
//! and tests can substitute in-memory fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conn;
pub mod network;
pub mod resolver;
pub mod udp;

pub use conn::{DatagramConn, TransportError, TransportResult};
pub use network::{TokioNetwork, UnderlyingNetwork};
pub use resolver::{DnsError, DnsResult, Resolver, SystemResolver};
pub use udp::UdpConn;
