//! # probeip STUN
//!
//! Session Traversal Utilities for NAT (RFC 5389), client side.
//!
//! This crate provides:
//! - The STUN message codec restricted to what a binding client needs: header,
//!   message type/class encoding and the XOR-MAPPED-ADDRESS attribute
//! - The client transaction of RFC 5389 Section 7.2.1: retransmission with
//!   exponential backoff, response validation and transaction timeout
//!
//! ## Example
//!
//! ```rust,no_run
//! use probeip_stun::{TransactionConfig, run_binding_request_transaction};
//! use probeip_transport::{TokioNetwork, UnderlyingNetwork};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let network = TokioNetwork::new();
//! let mut conn = network.dial_udp("192.0.2.10:3478".parse()?).await?;
//!
//! let response = run_binding_request_transaction(&mut *conn, &TransactionConfig::default()).await?;
//! println!("mapped address: {:?}", response.xor_mapped_address());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod message;
pub mod transaction;

pub use error::StunError;
pub use message::{
    HEADER_SIZE, MAGIC_COOKIE, StunAttribute, StunMessage, StunMessageClass, StunMethod,
    TransactionId,
};
pub use transaction::{
    DEFAULT_RC, DEFAULT_RM, DEFAULT_RTO, TransactionConfig, run_binding_request_transaction,
};
