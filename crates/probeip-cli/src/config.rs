//! Configuration system for the probeip CLI.

use probeip_geolocate::{StunLookupConfig, split_host_port};
use probeip_stun::{DEFAULT_RC, DEFAULT_RM, DEFAULT_RTO, TransactionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// probeip configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// STUN lookup configuration
    #[serde(default)]
    pub stun: StunConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// STUN lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StunConfig {
    /// STUN server, `host:port`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Maximum number of transmissions per candidate
    #[serde(default = "default_rc")]
    pub rc: u32,
    /// RTOs to wait after the last transmission
    #[serde(default = "default_rm")]
    pub rm: u32,
    /// Initial retransmission timeout in milliseconds
    #[serde(default = "default_rto_ms")]
    pub rto_ms: u64,
    /// Bound on the whole race in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_endpoint() -> String {
    "stun.l.google.com:19302".to_string()
}

fn default_rc() -> u32 {
    DEFAULT_RC
}

fn default_rm() -> u32 {
    DEFAULT_RM
}

fn default_rto_ms() -> u64 {
    DEFAULT_RTO.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    probeip_geolocate::DEFAULT_OVERALL_TIMEOUT.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StunConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            rc: default_rc(),
            rm: default_rm(),
            rto_ms: default_rto_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("probeip/config.toml")
    }

    /// Load config from the default path, falling back to defaults if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Transaction parameters of every STUN candidate
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is zero.
    pub fn transaction_config(&self) -> anyhow::Result<TransactionConfig> {
        Ok(TransactionConfig::new(
            self.stun.rc,
            self.stun.rm,
            Duration::from_millis(self.stun.rto_ms),
        )?)
    }

    /// STUN lookup configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction parameters are invalid.
    pub fn lookup_config(&self) -> anyhow::Result<StunLookupConfig> {
        Ok(StunLookupConfig::default()
            .with_transaction(self.transaction_config()?)
            .with_overall_timeout(Duration::from_millis(self.stun.timeout_ms)))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        split_host_port(&self.stun.endpoint)?;

        self.transaction_config()?;

        if self.stun.timeout_ms == 0 {
            anyhow::bail!("STUN timeout must be positive");
        }

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }
}
