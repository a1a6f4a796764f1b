//! Probe IP lookup over STUN.
//!
//! The STUN server's host is resolved into every address of the requested
//! family and one binding-request transaction is raced per address. The first
//! mapped address to come back wins; the other attempts are aborted when the
//! lookup returns, so no attempt outlives it.

use crate::error::{CandidateFailure, LookupError};
use crate::filter::AddressFilter;
use crate::resolver_filter::{CloseIdleOnDrop, FilteringResolver};
use probeip_stun::{StunError, StunMessage, StunMessageClass, TransactionConfig};
use probeip_transport::{Resolver, UnderlyingNetwork};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Default bound on the racing phase of a lookup
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(4);

/// STUN lookup configuration
#[derive(Debug, Clone)]
pub struct StunLookupConfig {
    /// Parameters of every candidate's transaction
    pub transaction: TransactionConfig,
    /// Bound on the racing phase, on top of the transactions' own deadlines
    pub overall_timeout: Duration,
}

impl Default for StunLookupConfig {
    fn default() -> Self {
        Self {
            transaction: TransactionConfig::default(),
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }
}

impl StunLookupConfig {
    /// Set the candidates' transaction parameters
    #[must_use]
    pub fn with_transaction(mut self, transaction: TransactionConfig) -> Self {
        self.transaction = transaction;
        self
    }

    /// Set the bound on the racing phase
    #[must_use]
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

/// Discovers the probe's public address with STUN.
///
/// Holds only immutable configuration, so one client serves any number of
/// lookups, concurrently or not.
#[derive(Clone)]
pub struct StunIpLookupClient {
    endpoint: String,
    resolver: Arc<dyn Resolver>,
    network: Arc<dyn UnderlyingNetwork>,
    config: StunLookupConfig,
}

impl std::fmt::Debug for StunIpLookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StunIpLookupClient")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StunIpLookupClient {
    /// Create a client for the STUN server at `endpoint` (`host:port`, with
    /// IPv6 literals in brackets)
    ///
    /// `resolver` resolves the endpoint's host and `network` dials the candidates.
    /// The endpoint is only parsed when a lookup runs.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        resolver: Arc<dyn Resolver>,
        network: Arc<dyn UnderlyingNetwork>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            resolver,
            network,
            config: StunLookupConfig::default(),
        }
    }

    /// Replace the lookup configuration
    #[must_use]
    pub fn with_config(mut self, config: StunLookupConfig) -> Self {
        self.config = config;
        self
    }

    /// Configured STUN server endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the probe's public IPv4 address
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidEndpoint` for a malformed endpoint,
    /// `LookupError::Dns` if the STUN server has no usable IPv4 address, and
    /// `LookupError::DeadlineExceeded` if no candidate answered before the
    /// overall timeout.
    pub async fn lookup_probe_ipv4(&self) -> Result<String, LookupError> {
        self.lookup_with_filter(AddressFilter::Ipv4Only).await
    }

    /// Returns the probe's public IPv6 address
    ///
    /// # Errors
    ///
    /// Same as [`StunIpLookupClient::lookup_probe_ipv4`].
    pub async fn lookup_probe_ipv6(&self) -> Result<String, LookupError> {
        self.lookup_with_filter(AddressFilter::Ipv6Only).await
    }

    async fn lookup_with_filter(&self, filter: AddressFilter) -> Result<String, LookupError> {
        let (host, port) = split_host_port(&self.endpoint)?;

        let reso = FilteringResolver::new(self.resolver.clone(), filter);
        let _close_idle = CloseIdleOnDrop(&reso);

        // Literal addresses come back unchanged from the resolver
        let addrs = reso.lookup_host(host).await?;

        let mut tasks = JoinSet::new();
        for addr in &addrs {
            let ip: IpAddr = match addr.parse() {
                Ok(ip) => ip,
                Err(_) => continue,
            };
            let candidate = SocketAddr::new(ip, port);
            let span = tracing::debug_span!("stun_candidate", endpoint = %candidate);
            tasks.spawn(
                probe_candidate(
                    self.network.clone(),
                    candidate,
                    self.config.transaction.clone(),
                )
                .instrument(span),
            );
        }
        tracing::debug!(
            endpoint = %self.endpoint,
            ?filter,
            candidates = tasks.len(),
            "racing STUN candidates"
        );

        let overall = tokio::time::sleep(self.config.overall_timeout);
        tokio::pin!(overall);

        let mut failures = Vec::new();
        loop {
            tokio::select! {
                () = &mut overall => {
                    tracing::debug!(failed = failures.len(), "STUN lookup deadline exceeded");
                    return Err(LookupError::DeadlineExceeded { failures });
                }
                // Once every candidate has failed only the deadline remains
                joined = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Some(Ok(Ok(mapped))) => {
                        tracing::info!(endpoint = %self.endpoint, %mapped, "STUN lookup succeeded");
                        return Ok(mapped);
                    }
                    Some(Ok(Err(failure))) => {
                        tracing::debug!("{failure}");
                        failures.push(failure);
                    }
                    Some(Err(join_error)) => {
                        if join_error.is_panic() {
                            std::panic::resume_unwind(join_error.into_panic());
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

/// Dial `endpoint`, run one transaction and extract the mapped IP address
async fn probe_candidate(
    network: Arc<dyn UnderlyingNetwork>,
    endpoint: SocketAddr,
    transaction: TransactionConfig,
) -> Result<String, CandidateFailure> {
    let fail = |error: StunError| CandidateFailure { endpoint, error };

    let mut conn = network
        .dial_udp(endpoint)
        .await
        .map_err(|e| fail(e.into()))?;
    let response = probeip_stun::run_binding_request_transaction(&mut *conn, &transaction)
        .await
        .map_err(fail)?;
    mapped_ip(&response).map_err(fail)
}

fn mapped_ip(response: &StunMessage) -> Result<String, StunError> {
    if response.class == StunMessageClass::ErrorResponse {
        return Err(StunError::ErrorResponse);
    }
    response
        .xor_mapped_address()
        .map(|addr| addr.ip().to_string())
        .ok_or(StunError::MissingAttribute)
}

/// Split `host:port` or `[host]:port` into its parts
///
/// # Errors
///
/// Returns `LookupError::InvalidEndpoint` if the port is missing or not a
/// number, the host is empty, or an IPv6 literal is not bracketed.
pub fn split_host_port(endpoint: &str) -> Result<(&str, u16), LookupError> {
    let invalid = |reason: &'static str| LookupError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let (host, port) = if let Some(rest) = endpoint.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        if host.contains(':') {
            return Err(invalid("too many colons in address"));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(invalid("missing host in address"));
    }
    let port = port.parse().map_err(|_| invalid("invalid port"))?;
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use probeip_transport::{
        DatagramConn, DnsError, DnsResult, TransportError, TransportResult,
    };
    use std::collections::{HashMap, VecDeque};
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Clone, Copy)]
    enum Behavior {
        /// Answer every request with this mapped address
        Respond(SocketAddr),
        /// Answer with a binding error response
        RespondError,
        /// Never answer, but honour deadlines
        Silent,
        /// Never answer and never time out
        Hung,
        /// Fail to dial
        Unreachable,
    }

    struct FakeConn {
        peer: SocketAddr,
        behavior: Behavior,
        inbox: VecDeque<Vec<u8>>,
        deadline: Option<Instant>,
        live: Arc<AtomicUsize>,
    }

    impl Drop for FakeConn {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DatagramConn for FakeConn {
        fn set_deadline(&mut self, deadline: Instant) -> TransportResult<()> {
            self.deadline = Some(deadline);
            Ok(())
        }

        async fn write(&mut self, buf: &[u8]) -> TransportResult<usize> {
            let request = StunMessage::decode(buf).expect("valid request");
            match self.behavior {
                Behavior::Respond(mapped) => self
                    .inbox
                    .push_back(StunMessage::binding_success(request.transaction_id, mapped).encode()),
                Behavior::RespondError => self.inbox.push_back(
                    StunMessage::new(
                        probeip_stun::StunMethod::Binding,
                        StunMessageClass::ErrorResponse,
                        request.transaction_id,
                    )
                    .encode(),
                ),
                _ => {}
            }
            Ok(buf.len())
        }

        async fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
            if let Some(datagram) = self.inbox.pop_front() {
                buf[..datagram.len()].copy_from_slice(&datagram);
                return Ok(datagram.len());
            }
            if let Behavior::Hung = self.behavior {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep_until(self.deadline.expect("deadline set")).await;
            Err(TransportError::DeadlineExceeded)
        }

        fn local_addr(&self) -> TransportResult<SocketAddr> {
            Ok("192.168.1.2:40000".parse().unwrap())
        }

        fn peer_addr(&self) -> TransportResult<SocketAddr> {
            Ok(self.peer)
        }
    }

    struct FakeNetwork {
        behaviors: HashMap<SocketAddr, Behavior>,
        dialed: Mutex<Vec<SocketAddr>>,
        live: Arc<AtomicUsize>,
    }

    impl FakeNetwork {
        fn new(behaviors: &[(&str, Behavior)]) -> Arc<Self> {
            Arc::new(Self {
                behaviors: behaviors
                    .iter()
                    .map(|(addr, b)| (addr.parse().unwrap(), *b))
                    .collect(),
                dialed: Mutex::new(Vec::new()),
                live: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn dialed(&self) -> Vec<SocketAddr> {
            self.dialed.lock().unwrap().clone()
        }

        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UnderlyingNetwork for FakeNetwork {
        async fn dial_udp(&self, endpoint: SocketAddr) -> TransportResult<Box<dyn DatagramConn>> {
            self.dialed.lock().unwrap().push(endpoint);
            let behavior = self.behaviors.get(&endpoint).copied().unwrap_or(Behavior::Silent);
            if let Behavior::Unreachable = behavior {
                return Err(TransportError::DialFailed {
                    endpoint,
                    source: io::Error::from(io::ErrorKind::NetworkUnreachable),
                });
            }
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeConn {
                peer: endpoint,
                behavior,
                inbox: VecDeque::new(),
                deadline: None,
                live: self.live.clone(),
            }))
        }

        async fn getaddrinfo_lookup_any(&self, _domain: &str) -> DnsResult<Vec<String>> {
            Err(DnsError::NoAnswer)
        }
    }

    struct FakeResolver {
        addrs: Vec<&'static str>,
        lookups: Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    impl FakeResolver {
        fn new(addrs: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                addrs: addrs.to_vec(),
                lookups: Mutex::new(Vec::new()),
                closes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Resolver for FakeResolver {
        async fn lookup_host(&self, domain: &str) -> DnsResult<Vec<String>> {
            self.lookups.lock().unwrap().push(domain.to_string());
            if domain.parse::<IpAddr>().is_ok() {
                return Ok(vec![domain.to_string()]);
            }
            if self.addrs.is_empty() {
                return Err(DnsError::Lookup {
                    domain: domain.to_string(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
            Ok(self.addrs.iter().map(|a| (*a).to_string()).collect())
        }

        fn close_idle_connections(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client(resolver: Arc<FakeResolver>, network: Arc<FakeNetwork>) -> StunIpLookupClient {
        StunIpLookupClient::new("stun.example.org:3478", resolver, network)
    }

    fn mapped(s: &str) -> Behavior {
        Behavior::Respond(s.parse().unwrap())
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("stun.l.google.com:19302").unwrap(),
            ("stun.l.google.com", 19302)
        );
        assert_eq!(
            split_host_port("192.0.2.1:3478").unwrap(),
            ("192.0.2.1", 3478)
        );
        assert_eq!(
            split_host_port("[2001:db8::1]:3478").unwrap(),
            ("2001:db8::1", 3478)
        );
    }

    #[test]
    fn test_split_host_port_rejects_malformed() {
        for endpoint in [
            "stun.example.org",
            "2001:db8::1:3478",
            "[2001:db8::1]",
            "[2001:db8::1:3478",
            "stun.example.org:http",
            "stun.example.org:70000",
            ":3478",
        ] {
            assert!(
                matches!(
                    split_host_port(endpoint),
                    Err(LookupError::InvalidEndpoint { .. })
                ),
                "{endpoint} should be rejected"
            );
        }
    }

    #[test]
    fn test_default_config() {
        let config = StunLookupConfig::default();
        assert_eq!(config.overall_timeout, Duration::from_secs(4));
        assert_eq!(config.transaction.rc(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_of_three_candidates_answers() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Silent),
            ("192.0.2.2:3478", mapped("198.51.100.9:55555")),
            ("192.0.2.3:3478", Behavior::Silent),
        ]);
        let client = client(resolver.clone(), network.clone());

        let ip = client.lookup_probe_ipv4().await.unwrap();

        assert_eq!(ip, "198.51.100.9");
        assert_eq!(network.dialed().len(), 3);
        assert_eq!(resolver.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_candidate_answers_before_deadline() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Silent),
            ("192.0.2.2:3478", Behavior::Silent),
            ("192.0.2.3:3478", Behavior::Hung),
        ]);
        let client = client(resolver, network.clone());
        let start = Instant::now();

        let result = client.lookup_probe_ipv4().await;

        match result {
            Err(LookupError::DeadlineExceeded { failures }) => assert!(failures.is_empty()),
            other => panic!("expected deadline error, got {other:?}"),
        }
        assert_eq!(start.elapsed(), DEFAULT_OVERALL_TIMEOUT);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(network.live(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_error_carries_failed_candidates() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Unreachable),
            ("192.0.2.2:3478", Behavior::Hung),
        ]);
        let client = client(resolver, network);

        let err = client.lookup_probe_ipv4().await.unwrap_err();

        assert!(matches!(err, LookupError::DeadlineExceeded { .. }));
        let failures = err.candidate_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].endpoint, "192.0.2.1:3478".parse().unwrap());
        assert!(matches!(
            failures[0].error,
            StunError::Transport(TransportError::DialFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_candidates_failing_still_ends_at_deadline() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Unreachable),
            ("192.0.2.2:3478", Behavior::RespondError),
            ("192.0.2.3:3478", Behavior::Unreachable),
        ]);
        let client = client(resolver, network);
        let start = Instant::now();

        let err = client.lookup_probe_ipv4().await.unwrap_err();

        assert!(matches!(err, LookupError::DeadlineExceeded { .. }));
        assert_eq!(err.candidate_failures().len(), 3);
        assert!(
            err.candidate_failures()
                .iter()
                .any(|f| matches!(f.error, StunError::ErrorResponse))
        );
        assert_eq!(start.elapsed(), DEFAULT_OVERALL_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_lookup_aborts_candidates() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Hung),
            ("192.0.2.2:3478", Behavior::Hung),
            ("192.0.2.3:3478", Behavior::Hung),
        ]);
        let client = client(resolver.clone(), network.clone());

        let outcome =
            tokio::time::timeout(Duration::from_millis(100), client.lookup_probe_ipv4()).await;

        assert!(outcome.is_err());
        assert_eq!(network.dialed().len(), 3);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(network.live(), 0);
        assert_eq!(resolver.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_winners_yield_one_result_and_no_leftover_tasks() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", mapped("198.51.100.1:1111")),
            ("192.0.2.2:3478", mapped("198.51.100.2:2222")),
            ("192.0.2.3:3478", Behavior::Hung),
        ]);
        let client = client(resolver, network.clone());

        let ip = client.lookup_probe_ipv4().await.unwrap();

        assert!(ip == "198.51.100.1" || ip == "198.51.100.2", "got {ip}");
        // Losers are aborted once the lookup returns; the hung one would
        // otherwise hold its connection forever
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(network.live(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_is_idempotent() {
        let resolver = FakeResolver::new(&["192.0.2.1", "192.0.2.2"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", Behavior::Unreachable),
            ("192.0.2.2:3478", mapped("203.0.113.50:4242")),
        ]);
        let client = client(resolver.clone(), network);

        let first = client.lookup_probe_ipv4().await.unwrap();
        let second = client.lookup_probe_ipv4().await.unwrap();

        assert_eq!(first, "203.0.113.50");
        assert_eq!(first, second);
        assert_eq!(resolver.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ipv6_lookup_races_only_ipv6_candidates() {
        let resolver = FakeResolver::new(&["192.0.2.1", "2001:db8::1"]);
        let network = FakeNetwork::new(&[
            ("192.0.2.1:3478", mapped("198.51.100.1:1111")),
            ("[2001:db8::1]:3478", mapped("[2001:db8:ffff::7]:1111")),
        ]);
        let client = client(resolver, network.clone());

        let ip = client.lookup_probe_ipv6().await.unwrap();

        assert_eq!(ip, "2001:db8:ffff::7");
        assert_eq!(
            network.dialed(),
            vec!["[2001:db8::1]:3478".parse::<SocketAddr>().unwrap()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_address_of_family_fails_before_racing() {
        let resolver = FakeResolver::new(&["::1"]);
        let network = FakeNetwork::new(&[]);
        let client = client(resolver.clone(), network.clone());

        let result = client.lookup_probe_ipv4().await;

        assert!(matches!(result, Err(LookupError::Dns(DnsError::NoAnswer))));
        assert!(network.dialed().is_empty());
        assert_eq!(resolver.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_failure_propagates() {
        let resolver = FakeResolver::new(&[]);
        let network = FakeNetwork::new(&[]);
        let client = client(resolver, network.clone());

        let result = client.lookup_probe_ipv4().await;

        assert!(matches!(
            result,
            Err(LookupError::Dns(DnsError::Lookup { .. }))
        ));
        assert!(network.dialed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_literal_endpoint_is_used_directly() {
        let resolver = FakeResolver::new(&[]);
        let network = FakeNetwork::new(&[(
            "[2001:db8::53]:19302",
            mapped("[2001:db8:1::1]:9"),
        )]);
        let client = StunIpLookupClient::new("[2001:db8::53]:19302", resolver.clone(), network);

        assert_eq!(client.lookup_probe_ipv6().await.unwrap(), "2001:db8:1::1");
        assert_eq!(
            resolver.lookups.lock().unwrap().as_slice(),
            ["2001:db8::53".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let client = StunIpLookupClient::new(
            "stun.example.org",
            FakeResolver::new(&["192.0.2.1"]),
            FakeNetwork::new(&[]),
        );

        let result = client.lookup_probe_ipv4().await;
        assert!(matches!(result, Err(LookupError::InvalidEndpoint { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_overall_timeout() {
        let resolver = FakeResolver::new(&["192.0.2.1"]);
        let network = FakeNetwork::new(&[("192.0.2.1:3478", Behavior::Silent)]);
        let client = client(resolver, network).with_config(
            StunLookupConfig::default().with_overall_timeout(Duration::from_millis(750)),
        );
        let start = Instant::now();

        let result = client.lookup_probe_ipv4().await;

        assert!(matches!(result, Err(LookupError::DeadlineExceeded { .. })));
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_transaction_config_failure_reported_at_deadline() {
        let resolver = FakeResolver::new(&["192.0.2.1"]);
        let network = FakeNetwork::new(&[("192.0.2.1:3478", Behavior::Silent)]);
        let transaction = TransactionConfig::new(2, 2, Duration::from_millis(100)).unwrap();
        let client = client(resolver, network)
            .with_config(StunLookupConfig::default().with_transaction(transaction));

        let start = Instant::now();

        let err = client.lookup_probe_ipv4().await.unwrap_err();

        assert!(matches!(err, LookupError::DeadlineExceeded { .. }));
        assert_eq!(start.elapsed(), DEFAULT_OVERALL_TIMEOUT);
        assert!(matches!(
            err.candidate_failures()[0].error,
            StunError::TransactionTimeout
        ));
    }
}
