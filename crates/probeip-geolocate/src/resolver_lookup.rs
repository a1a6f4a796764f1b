//! Breakout IP of the system resolver.
//!
//! The diagnostic domains below answer with the address of whoever queried
//! them, which for `getaddrinfo` is the egress address of the system resolver.
//! Only the system resolver gives a meaningful answer here, so this client
//! talks to the [`UnderlyingNetwork`] directly and takes no [`Resolver`].
//!
//! [`Resolver`]: probeip_transport::Resolver

use crate::error::LookupError;
use probeip_transport::{DnsError, UnderlyingNetwork};
use std::sync::Arc;
use std::time::Duration;

/// Domain answering with the resolver's IPv4 egress address
pub const IPV4_BREAKOUT_DOMAIN: &str = "whoami.v4.powerdns.org";

/// Domain answering with the resolver's IPv6 egress address
pub const IPV6_BREAKOUT_DOMAIN: &str = "whoami.v6.powerdns.org";

/// Default bound on one breakout lookup
pub const DEFAULT_RESOLVER_LOOKUP_TIMEOUT: Duration = Duration::from_secs(4);

/// Discovers the breakout addresses used by the system resolver
#[derive(Clone)]
pub struct ResolverIpLookupClient {
    network: Arc<dyn UnderlyingNetwork>,
    timeout: Duration,
}

impl std::fmt::Debug for ResolverIpLookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverIpLookupClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResolverIpLookupClient {
    /// Create a client resolving through `network`'s getaddrinfo
    #[must_use]
    pub fn new(network: Arc<dyn UnderlyingNetwork>) -> Self {
        Self {
            network,
            timeout: DEFAULT_RESOLVER_LOOKUP_TIMEOUT,
        }
    }

    /// Set the bound on one lookup
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the IPv4 address the system resolver reaches the network from
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Dns` if the lookup fails or times out.
    ///
    /// # Panics
    ///
    /// Panics if the system resolver reports success with no address.
    pub async fn lookup_resolver_ipv4_addr(&self) -> Result<String, LookupError> {
        self.lookup(IPV4_BREAKOUT_DOMAIN).await
    }

    /// Returns the IPv6 address the system resolver reaches the network from
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Dns` if the lookup fails or times out.
    ///
    /// # Panics
    ///
    /// Panics if the system resolver reports success with no address.
    pub async fn lookup_resolver_ipv6_addr(&self) -> Result<String, LookupError> {
        self.lookup(IPV6_BREAKOUT_DOMAIN).await
    }

    async fn lookup(&self, domain: &str) -> Result<String, LookupError> {
        let mut addrs = tokio::time::timeout(
            self.timeout,
            self.network.getaddrinfo_lookup_any(domain),
        )
        .await
        .map_err(|_| DnsError::Timeout)??;

        assert!(
            !addrs.is_empty(),
            "getaddrinfo_lookup_any returned zero IP addresses for {domain}"
        );
        let addr = addrs.swap_remove(0);
        tracing::info!(domain, %addr, "resolver breakout address");
        Ok(addr)
    }
}
