//! STUN client transaction over an unreliable transport (RFC 5389 Section 7.2.1)
//!
//! One binding request is built per transaction and retransmitted, with the same
//! transaction ID, up to `Rc` times. The wait after each transmission starts at
//! `RTO` and doubles every time; the wait after the last transmission is `Rm`
//! times the RTO in effect at that point. Only an elapsed deadline advances the
//! retransmission loop; every other transport error ends the transaction.
//!
//! Responses are validated as in RFC 5389 Section 7.3: datagrams that do not
//! decode, are not Binding success/error responses, or carry another
//! transaction ID are dropped without touching the current deadline.

use crate::error::StunError;
use crate::message::StunMessage;
use probeip_transport::DatagramConn;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, Span};

/// Default maximum number of transmissions (Rc)
pub const DEFAULT_RC: u32 = 7;

/// Default number of RTOs to wait after the last transmission (Rm)
pub const DEFAULT_RM: u32 = 16;

/// Default initial retransmission timeout (RTO)
pub const DEFAULT_RTO: Duration = Duration::from_millis(500);

/// Receive buffer size for responses
const RESPONSE_BUFFER_SIZE: usize = 4 << 10;

/// Upper bound for a single wait when the backoff saturates
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Transaction parameters
///
/// Rc, Rm and RTO are always strictly positive: [`TransactionConfig::new`]
/// rejects anything else and the `with_*` setters panic on it.
#[derive(Debug, Clone)]
pub struct TransactionConfig {
    /// Maximum number of transmissions
    rc: u32,
    /// RTOs to wait after the last transmission
    rm: u32,
    /// Initial retransmission timeout
    rto: Duration,
    /// Span the transaction's events are recorded in
    span: Span,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            rc: DEFAULT_RC,
            rm: DEFAULT_RM,
            rto: DEFAULT_RTO,
            span: Span::none(),
        }
    }
}

impl TransactionConfig {
    /// Create transaction parameters
    ///
    /// # Errors
    ///
    /// Returns `StunError::InvalidConfig` if any parameter is zero.
    pub fn new(rc: u32, rm: u32, rto: Duration) -> Result<Self, StunError> {
        if rc == 0 {
            return Err(StunError::InvalidConfig("rc must be positive"));
        }
        if rm == 0 {
            return Err(StunError::InvalidConfig("rm must be positive"));
        }
        if rto.is_zero() {
            return Err(StunError::InvalidConfig("rto must be positive"));
        }
        Ok(Self {
            rc,
            rm,
            rto,
            ..Self::default()
        })
    }

    /// Set the maximum number of transmissions
    ///
    /// # Panics
    ///
    /// Panics if `rc` is zero.
    #[must_use]
    pub fn with_rc(mut self, rc: u32) -> Self {
        assert!(rc > 0, "TransactionConfig::with_rc passed a zero value");
        self.rc = rc;
        self
    }

    /// Set the number of RTOs to wait after the last transmission
    ///
    /// # Panics
    ///
    /// Panics if `rm` is zero.
    #[must_use]
    pub fn with_rm(mut self, rm: u32) -> Self {
        assert!(rm > 0, "TransactionConfig::with_rm passed a zero value");
        self.rm = rm;
        self
    }

    /// Set the initial retransmission timeout
    ///
    /// # Panics
    ///
    /// Panics if `rto` is zero.
    #[must_use]
    pub fn with_rto(mut self, rto: Duration) -> Self {
        assert!(!rto.is_zero(), "TransactionConfig::with_rto passed a zero value");
        self.rto = rto;
        self
    }

    /// Record the transaction's events inside `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Maximum number of transmissions
    #[must_use]
    pub fn rc(&self) -> u32 {
        self.rc
    }

    /// RTOs to wait after the last transmission
    #[must_use]
    pub fn rm(&self) -> u32 {
        self.rm
    }

    /// Initial retransmission timeout
    #[must_use]
    pub fn rto(&self) -> Duration {
        self.rto
    }

    /// The wait following each transmission, in order
    ///
    /// With the defaults this is 0.5s, 1s, 2s, 4s, 8s, 16s and finally
    /// 16 x 32s: the RTO is doubled before the last wait is derived from it.
    /// Each wait is computed when the iterator reaches it.
    pub fn attempt_timeouts(&self) -> impl Iterator<Item = Duration> {
        let (rc, rm) = (self.rc, self.rm);
        let mut rto = self.rto;
        (0..rc).map(move |idx| {
            let timeout = if idx == rc - 1 {
                rto.saturating_mul(rm)
            } else {
                rto
            };
            rto = rto.saturating_mul(2);
            timeout
        })
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// Run a binding-request transaction over the connected transport `conn`
///
/// Returns the first Binding success or Binding error response carrying the
/// request's transaction ID. Interpreting an error response is left to the caller.
///
/// # Errors
///
/// Returns `StunError::Transport` on any write failure or any read failure other
/// than an elapsed deadline, and `StunError::TransactionTimeout` once every
/// transmission has been waited out.
pub async fn run_binding_request_transaction<C>(
    conn: &mut C,
    config: &TransactionConfig,
) -> Result<StunMessage, StunError>
where
    C: DatagramConn + ?Sized,
{
    let span = config.span.clone();
    run(conn, config).instrument(span).await
}

async fn run<C>(conn: &mut C, config: &TransactionConfig) -> Result<StunMessage, StunError>
where
    C: DatagramConn + ?Sized,
{
    let request = StunMessage::binding_request();
    let raw_request = request.encode();
    let mut buf = vec![0u8; RESPONSE_BUFFER_SIZE];

    for (attempt, timeout) in config.attempt_timeouts().enumerate() {
        if let Err(e) = conn.set_deadline(deadline_after(timeout)) {
            tracing::debug!("stun: cannot set conn deadline: {e}");
            return Err(e.into());
        }

        if let Err(e) = conn.write(&raw_request).await {
            tracing::debug!("stun: conn write failed: {e}");
            return Err(e.into());
        }
        tracing::trace!(attempt, ?timeout, "stun: binding request sent");

        loop {
            let len = match conn.read(&mut buf).await {
                Ok(len) => len,
                Err(e) if e.is_deadline_exceeded() => break,
                Err(e) => {
                    tracing::debug!("stun: conn read failed: {e}");
                    return Err(e.into());
                }
            };

            let response = match StunMessage::decode(&buf[..len]) {
                Ok(response) => response,
                // Not STUN: skipped like any other unrelated datagram, the
                // deadline keeps running
                Err(e) => {
                    tracing::trace!("stun: dropping undecodable datagram: {e}");
                    continue;
                }
            };

            if !response.is_binding_response() {
                tracing::trace!(method = ?response.method, class = ?response.class, "stun: dropping unexpected message type");
                continue;
            }
            if response.transaction_id != request.transaction_id {
                tracing::trace!("stun: dropping response for another transaction");
                continue;
            }

            return Ok(response);
        }
    }

    tracing::debug!(rc = config.rc, "stun: transaction timed out");
    Err(StunError::TransactionTimeout)
}
