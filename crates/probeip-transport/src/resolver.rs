//! Name resolution.

use crate::network::UnderlyingNetwork;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// DNS resolution errors
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    /// The underlying resolver failed
    #[error("dns lookup for {domain} failed: {source}")]
    Lookup {
        /// Queried domain
        domain: String,
        /// Resolver error
        #[source]
        source: io::Error,
    },

    /// Resolution succeeded but yielded no address usable by the caller
    #[error("dns_no_answer")]
    NoAnswer,

    /// The lookup did not complete in time
    #[error("dns lookup timed out")]
    Timeout,
}

/// Result type for DNS operations
pub type DnsResult<T> = Result<T, DnsError>;

/// Name resolver returning literal IP address strings.
///
/// Implementations MUST return a literal IP address passed as `domain` unchanged,
/// the way `getaddrinfo` does.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `domain` into IP address strings.
    ///
    /// # Errors
    /// Returns `DnsError` if resolution fails
    async fn lookup_host(&self, domain: &str) -> DnsResult<Vec<String>>;

    /// Release idle connections held by the resolver, if any.
    fn close_idle_connections(&self);
}

/// Resolver using the system `getaddrinfo` through an [`UnderlyingNetwork`].
#[derive(Clone)]
pub struct SystemResolver {
    network: Arc<dyn UnderlyingNetwork>,
}

impl SystemResolver {
    /// Create a system resolver over `network`.
    #[must_use]
    pub fn new(network: Arc<dyn UnderlyingNetwork>) -> Self {
        Self { network }
    }
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup_host(&self, domain: &str) -> DnsResult<Vec<String>> {
        if domain.parse::<IpAddr>().is_ok() {
            return Ok(vec![domain.to_string()]);
        }
        self.network.getaddrinfo_lookup_any(domain).await
    }

    fn close_idle_connections(&self) {
        // getaddrinfo keeps no connections around
    }
}
