//! Configuration Module
//!
//! All tunables for a run are loaded from a TOML file and parsed with serde.
//! The seed phrase is deliberately NOT part of the file: it is read from the
//! `MASSMINT_SEED` environment variable at startup, and its absence is a
//! fatal startup error rather than a per-operation error.

use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::types::{Address, ObjectId, OrchestratorError};

/// Environment variable holding the BIP-39 seed phrase
pub const SEED_ENV_VAR: &str = "MASSMINT_SEED";

/// Main configuration structure
///
/// # Example TOML
/// ```toml
/// [ledger]
/// endpoint_url = "https://fullnode.testnet.example.io:443"
/// package_id = "0x6f3e…"
///
/// [run]
/// total_amount = 1000000
/// burn_chunk = 2
/// coin_chunk = 100
/// split_amount = 3000000000
/// recipient = "0x3d10…"
/// mode = "pre_sign"
/// max_attempts = 0
/// base_delay_ms = 200
/// max_delay_ms = 5000
///
/// [output]
/// directory = "out"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

/// Ledger connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the full node
    pub endpoint_url: String,
    /// Identifier of the deployed contract package
    pub package_id: String,
}

/// Parameters of one mint/burn run
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Total units to mint, divided across workers by integer division
    pub total_amount: u64,
    /// Created objects per burn group (one group per burn worker)
    pub burn_chunk: usize,
    /// Coins merged or split per pool-preparation transaction
    pub coin_chunk: usize,
    /// Value of each gas coin produced by the split step
    pub split_amount: u64,
    /// Address receiving minted objects
    pub recipient: String,
    /// `pre_sign` (sign offline, then submit) or `combined` (sign-and-submit)
    pub mode: PipelineMode,
    /// Maximum submission attempts per worker; 0 means retry without bound
    #[serde(default)]
    pub max_attempts: u32,
    /// Initial backoff delay between attempts, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff delay ceiling, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

/// Whether workers pre-sign payloads or sign-and-submit in one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Build and sign all payloads offline first, then submit concurrently.
    /// Transient failures resubmit the identical bytes.
    PreSign,
    /// Build, sign and submit per attempt. Transient failures rebuild against
    /// the worker's current gas reference.
    Combined,
}

/// Durable output settings
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving metrics artifacts and the created-objects listing
    pub directory: String,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was read and parsed successfully
    /// * `Err` if the file is missing or the TOML is invalid
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Read the seed phrase from the environment
    ///
    /// Missing or empty values abort startup before any work begins.
    pub fn seed_phrase() -> Result<String, OrchestratorError> {
        match std::env::var(SEED_ENV_VAR) {
            Ok(phrase) if !phrase.trim().is_empty() => Ok(phrase),
            _ => Err(OrchestratorError::MissingConfig(SEED_ENV_VAR.into())),
        }
    }

    /// The retry policy implied by the `[run]` section
    ///
    /// `max_attempts = 0` maps to an unbounded policy; any other value
    /// bounds each worker's retry loop.
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.run.base_delay_ms);
        let max = Duration::from_millis(self.run.max_delay_ms);
        if self.run.max_attempts == 0 {
            RetryPolicy::unbounded(base, max)
        } else {
            RetryPolicy::bounded(self.run.max_attempts, base, max)
        }
    }

    pub fn package_id(&self) -> ObjectId {
        ObjectId(self.ledger.package_id.clone())
    }

    pub fn recipient(&self) -> Address {
        Address(self.run.recipient.clone())
    }
}
