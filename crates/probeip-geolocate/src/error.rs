//! Lookup errors.

use probeip_stun::StunError;
use probeip_transport::DnsError;
use std::net::SocketAddr;
use thiserror::Error;

/// Why one racing candidate did not produce an address
#[derive(Debug, Error)]
#[error("candidate {endpoint}: {error}")]
pub struct CandidateFailure {
    /// Candidate the attempt was made against
    pub endpoint: SocketAddr,
    /// Dial, transaction or response error
    #[source]
    pub error: StunError,
}

/// Errors surfaced by the lookup clients
#[derive(Debug, Error)]
pub enum LookupError {
    /// The configured endpoint is not of the `host:port` form
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Offending endpoint
        endpoint: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Name resolution failed or yielded nothing of the requested family
    #[error(transparent)]
    Dns(#[from] DnsError),

    /// The overall deadline elapsed before any candidate answered
    #[error("lookup deadline exceeded ({} failed candidates)", .failures.len())]
    DeadlineExceeded {
        /// Candidates that had already failed when the deadline elapsed
        failures: Vec<CandidateFailure>,
    },
}

impl LookupError {
    /// Per-candidate failures carried by a deadline error, empty otherwise
    #[must_use]
    pub fn candidate_failures(&self) -> &[CandidateFailure] {
        match self {
            Self::DeadlineExceeded { failures } => failures,
            _ => &[],
        }
    }
}
