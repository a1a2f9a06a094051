//! Configuration module for the ledger pipeline
//!
//! This module handles configuration loading from TOML files, `.env` files
//! and environment variables, and provides structured configuration types.

use crate::address::well_known::DEFAULT_TODO_PROGRAM_ID;
use crate::correlate::DEFAULT_CLUSTER;
use crate::types::AccountLocator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `rpc.url`
pub const ENV_RPC_URL: &str = "LEDGER_RPC_URL";
/// Environment variable overriding `wallet.keypair_path`
pub const ENV_KEYPAIR_PATH: &str = "LEDGER_KEYPAIR_PATH";
/// Environment variable overriding `explorer.cluster`
pub const ENV_CLUSTER: &str = "LEDGER_CLUSTER";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Program ids used by the well-known derivations
    #[serde(default)]
    pub programs: ProgramsConfig,

    /// Block explorer links
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment level for reads and preflight
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// How long a fetched blockhash is treated as fresh
    #[serde(default = "default_blockhash_validity")]
    pub blockhash_validity_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file; a leading `~/` expands to `$HOME`
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramsConfig {
    /// Base58 id of the deployed todo program
    #[serde(default = "default_todo_program")]
    pub todo_program_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Cluster name appended to explorer links
    #[serde(default = "default_cluster")]
    pub cluster: String,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.devnet.solana.com".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_blockhash_validity() -> u64 { 60 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_todo_program() -> String { DEFAULT_TODO_PROGRAM_ID.to_base58() }
fn default_cluster() -> String { DEFAULT_CLUSTER.to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
            commitment: default_commitment(),
            blockhash_validity_secs: default_blockhash_validity(),
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

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            todo_program_id: default_todo_program(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    ///
    /// A missing file is not an error when `path` is `None`; defaults apply.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup, e.g. the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(path) = lookup(ENV_KEYPAIR_PATH) {
            self.wallet.keypair_path = path;
        }
        if let Some(cluster) = lookup(ENV_CLUSTER) {
            self.explorer.cluster = cluster;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.url.is_empty() {
            anyhow::bail!("rpc.url must not be empty");
        }
        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be positive");
        }
        self.todo_program()?;
        Ok(())
    }

    pub fn todo_program(&self) -> anyhow::Result<AccountLocator> {
        self.programs
            .todo_program_id
            .parse::<AccountLocator>()
            .with_context(|| {
                format!(
                    "Invalid programs.todo_program_id '{}'",
                    self.programs.todo_program_id
                )
            })
    }

    /// Keypair path with a leading `~/` expanded
    pub fn keypair_path(&self) -> PathBuf {
        expand_home(&self.wallet.keypair_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
