//! Family-filtering resolver decorator.

use crate::filter::AddressFilter;
use async_trait::async_trait;
use probeip_transport::{DnsError, DnsResult, Resolver};
use std::sync::Arc;

/// Resolver returning only the addresses of one family.
///
/// Wraps a shared resolver without modifying it. A lookup that succeeds
/// underneath but leaves nothing after filtering fails with
/// [`DnsError::NoAnswer`], so callers can tell it apart from a resolution
/// failure.
#[derive(Clone)]
pub struct FilteringResolver {
    inner: Arc<dyn Resolver>,
    filter: AddressFilter,
}

impl FilteringResolver {
    /// Keep only the addresses of `inner` accepted by `filter`
    #[must_use]
    pub fn new(inner: Arc<dyn Resolver>, filter: AddressFilter) -> Self {
        Self { inner, filter }
    }
}

impl std::fmt::Debug for FilteringResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteringResolver")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for FilteringResolver {
    async fn lookup_host(&self, domain: &str) -> DnsResult<Vec<String>> {
        let addrs = self.inner.lookup_host(domain).await?;
        let kept: Vec<String> = addrs
            .into_iter()
            .filter(|addr| self.filter.matches(addr))
            .collect();
        if kept.is_empty() {
            tracing::debug!(domain, filter = ?self.filter, "no address of the requested family");
            return Err(DnsError::NoAnswer);
        }
        Ok(kept)
    }

    fn close_idle_connections(&self) {
        self.inner.close_idle_connections();
    }
}

/// Releases a resolver's idle connections when dropped
pub(crate) struct CloseIdleOnDrop<'a>(pub(crate) &'a dyn Resolver);

impl Drop for CloseIdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close_idle_connections();
    }
}
