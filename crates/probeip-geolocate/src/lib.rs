//! # probeip Geolocate
//!
//! Discovery of the addresses a probe is seen from on the public internet.
//!
//! This crate provides:
//! - Address family predicates over literal IP address strings
//! - A [`Resolver`](probeip_transport::Resolver) decorator keeping only one address family
//! - [`StunIpLookupClient`]: the probe's public address, obtained by racing a STUN
//!   binding request over every resolved address of the STUN server
//! - [`ResolverIpLookupClient`]: the egress address of the system resolver
//!
//! ## Example
//!
//! ```rust,no_run
//! use probeip_geolocate::StunIpLookupClient;
//! use probeip_transport::{SystemResolver, TokioNetwork};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), probeip_geolocate::LookupError> {
//! let network = Arc::new(TokioNetwork::new());
//! let resolver = Arc::new(SystemResolver::new(network.clone()));
//! let client = StunIpLookupClient::new("stun.l.google.com:19302", resolver, network);
//!
//! let ipv4 = client.lookup_probe_ipv4().await?;
//! println!("probe IPv4 address: {ipv4}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod resolver_filter;
pub mod resolver_lookup;
pub mod stun_lookup;

pub use error::{CandidateFailure, LookupError};
pub use filter::{AddressFilter, is_ipv4_literal, is_ipv6_literal};
pub use resolver_filter::FilteringResolver;
pub use resolver_lookup::{
    DEFAULT_RESOLVER_LOOKUP_TIMEOUT, IPV4_BREAKOUT_DOMAIN, IPV6_BREAKOUT_DOMAIN,
    ResolverIpLookupClient,
};
pub use stun_lookup::{
    DEFAULT_OVERALL_TIMEOUT, StunIpLookupClient, StunLookupConfig, split_host_port,
};
