//! Address family predicates.
//!
//! Both predicates work on the textual form: an address is IPv6 iff it parses
//! as an IP address and contains a colon. IPv4-mapped IPv6 addresses such as
//! `::ffff:192.0.2.1` are therefore IPv6.

use std::net::IpAddr;

/// Whether `addr` is a literal IPv4 address
#[must_use]
pub fn is_ipv4_literal(addr: &str) -> bool {
    addr.parse::<IpAddr>().is_ok() && !addr.contains(':')
}

/// Whether `addr` is a literal IPv6 address
#[must_use]
pub fn is_ipv6_literal(addr: &str) -> bool {
    addr.parse::<IpAddr>().is_ok() && addr.contains(':')
}

/// Address family to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFilter {
    /// Literal IPv4 addresses only
    Ipv4Only,
    /// Literal IPv6 addresses only
    Ipv6Only,
}

impl AddressFilter {
    /// Whether `addr` passes the filter
    #[must_use]
    pub fn matches(self, addr: &str) -> bool {
        match self {
            Self::Ipv4Only => is_ipv4_literal(addr),
            Self::Ipv6Only => is_ipv6_literal(addr),
        }
    }
}
