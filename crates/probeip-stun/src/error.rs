//! Error types for the STUN client.

use probeip_transport::TransportError;
use thiserror::Error;

/// STUN errors
#[derive(Debug, Error)]
pub enum StunError {
    /// Transport failure other than an elapsed retransmission deadline
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every retransmission elapsed without an acceptable response
    #[error("transaction is timed out")]
    TransactionTimeout,

    /// Message shorter than its header or its declared length
    #[error("STUN message too short")]
    MessageTooShort,

    /// Invalid magic cookie
    #[error("invalid STUN magic cookie")]
    InvalidMagicCookie,

    /// Invalid message type
    #[error("invalid STUN message type")]
    InvalidMessageType,

    /// Malformed attribute
    #[error("invalid STUN attribute")]
    InvalidAttribute,

    /// Required attribute not present
    #[error("missing required STUN attribute")]
    MissingAttribute,

    /// Binding error response received where a success was required
    #[error("STUN error response")]
    ErrorResponse,

    /// Invalid transaction parameters
    #[error("invalid transaction configuration: {0}")]
    InvalidConfig(&'static str),
}
