//! Configuration loading from TOML files and environment overrides

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster RPC configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Priority fee configuration
    #[serde(default)]
    pub fees: FeeConfig,

    /// Send/confirm retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Brute-force search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Jito bundle configuration
    #[serde(default)]
    pub jito: JitoConfig,

    /// Transaction history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment level used for status queries ("processed", "confirmed", "finalized")
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Base fee used when the cluster query fails (micro-lamports per CU)
    #[serde(default = "default_base_fee")]
    pub fallback_micro_lamports: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Resubmissions after the first send
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Interval between status polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Per-attempt confirmation timeout in seconds
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Base backoff delay before a resubmission, in milliseconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Backoff delay cap in milliseconds
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    /// Skip preflight simulation on broadcast
    #[serde(default = "default_true")]
    pub skip_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Worker threads for vanity grinding (0 = all available cores)
    #[serde(default)]
    pub threads: usize,

    /// Attempts between progress reports
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitoConfig {
    /// Block engine bundle endpoint
    #[serde(default = "default_block_engine_url")]
    pub block_engine_url: String,

    /// Tip in lamports appended to the last bundle transaction
    #[serde(default = "default_jito_tip")]
    pub tip_lamports: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the history JSON file
    #[serde(default = "default_history_path")]
    pub path: String,
}

// Default value functions
fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_rpc_timeout() -> u64 {
    30
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_keypair_path() -> String {
    "~/.config/solana/id.json".to_string()
}
fn default_base_fee() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_poll_interval() -> u64 {
    500
}
fn default_confirmation_timeout() -> u64 {
    30
}
fn default_backoff_base() -> u64 {
    250
}
fn default_backoff_max() -> u64 {
    4000
}
fn default_progress_interval() -> u64 {
    10_000
}
fn default_block_engine_url() -> String {
    "https://mainnet.block-engine.jito.wtf/api/v1/bundles".to_string()
}
fn default_jito_tip() -> u64 {
    10_000
}
fn default_history_path() -> String {
    "solkit-history.json".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
            commitment: default_commitment(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fallback_micro_lamports: default_base_fee(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            skip_preflight: default_true(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for JitoConfig {
    fn default() -> Self {
        Self {
            block_engine_url: default_block_engine_url(),
            tip_lamports: default_jito_tip(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            fees: FeeConfig::default(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            jito: JitoConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides.
    ///
    /// `SOLKIT_RPC_URL` and `SOLKIT_KEYPAIR` override the file values.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        if let Ok(url) = std::env::var("SOLKIT_RPC_URL") {
            config.rpc.url = url;
        }
        if let Ok(keypair) = std::env::var("SOLKIT_KEYPAIR") {
            config.wallet.keypair_path = keypair;
        }
        Ok(config)
    }
}

impl RetryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}
