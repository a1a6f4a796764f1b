//! probeip CLI
//!
//! Discovers the public addresses of this host and of its system resolver.

mod config;

use clap::{Parser, Subcommand, ValueEnum};
use probeip_geolocate::{ResolverIpLookupClient, StunIpLookupClient};
use probeip_transport::{SystemResolver, TokioNetwork, UnderlyingNetwork};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::Config;

/// probeip - public IP discovery over STUN
#[derive(Parser)]
#[command(name = "probeip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the probe's public address with STUN
    Stun {
        /// STUN server (host:port), overriding the configuration
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Address family to discover
        #[arg(long, value_enum, default_value_t = Family::Both)]
        family: Family,
    },

    /// Discover the system resolver's breakout address
    Resolver {
        /// Address family to discover
        #[arg(long, value_enum, default_value_t = Family::Both)]
        family: Family,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Family {
    V4,
    V6,
    Both,
}

impl Family {
    fn wants_v4(self) -> bool {
        matches!(self, Self::V4 | Self::Both)
    }

    fn wants_v6(self) -> bool {
        matches!(self, Self::V6 | Self::Both)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    if let Commands::Stun {
        endpoint: Some(endpoint),
        ..
    } = &cli.command
    {
        config.stun.endpoint.clone_from(endpoint);
    }

    // Validate configuration
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let network: Arc<dyn UnderlyingNetwork> = Arc::new(TokioNetwork::new());

    let failed = match cli.command {
        Commands::Stun { family, .. } => lookup_probe(&config, network, family).await?,
        Commands::Resolver { family } => lookup_resolver(network, family).await,
    };

    if failed > 0 {
        anyhow::bail!("{failed} lookup(s) failed");
    }
    Ok(())
}

/// Run the STUN lookups, returning how many failed
async fn lookup_probe(
    config: &Config,
    network: Arc<dyn UnderlyingNetwork>,
    family: Family,
) -> anyhow::Result<usize> {
    let resolver = Arc::new(SystemResolver::new(network.clone()));
    let client = StunIpLookupClient::new(config.stun.endpoint.clone(), resolver, network)
        .with_config(config.lookup_config()?);

    tracing::info!("Using STUN server {}", client.endpoint());

    let mut failed = 0;
    if family.wants_v4() {
        failed += usize::from(!report("probe IPv4", client.lookup_probe_ipv4().await));
    }
    if family.wants_v6() {
        failed += usize::from(!report("probe IPv6", client.lookup_probe_ipv6().await));
    }
    Ok(failed)
}

/// Run the resolver breakout lookups, returning how many failed
async fn lookup_resolver(network: Arc<dyn UnderlyingNetwork>, family: Family) -> usize {
    let client = ResolverIpLookupClient::new(network);

    let mut failed = 0;
    if family.wants_v4() {
        failed += usize::from(!report(
            "resolver IPv4",
            client.lookup_resolver_ipv4_addr().await,
        ));
    }
    if family.wants_v6() {
        failed += usize::from(!report(
            "resolver IPv6",
            client.lookup_resolver_ipv6_addr().await,
        ));
    }
    failed
}

/// Print one lookup outcome, returning whether it succeeded
fn report(what: &str, result: Result<String, probeip_geolocate::LookupError>) -> bool {
    match result {
        Ok(addr) => {
            tracing::info!("{what}: {addr}");
            println!("{what}: {addr}");
            true
        }
        Err(e) => {
            tracing::warn!("{what} lookup failed: {e}");
            for failure in e.candidate_failures() {
                tracing::debug!("  {failure}");
            }
            println!("{what}: error: {e}");
            false
        }
    }
}
