//! Pipeline configuration
//!
//! Values come from the environment (and a `.env` file when present), with
//! command-line flags applied on top by the binary.

use crate::error::{IngestError, Result};
use ferronet_core::layers::DEFAULT_MAX_HOPS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_CORE_SOURCE: &str = "KEGG";

pub const DEFAULT_UNIPROT_BASE_URL: &str = "https://rest.uniprot.org";
pub const DEFAULT_UNIPROT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_UNIPROT_BACKOFF_FACTOR: f64 = 1.5;
pub const DEFAULT_UNIPROT_MAX_POLL_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_UNIPROT_MAX_POLLS: u32 = 120;
pub const DEFAULT_UNIPROT_BATCH_SIZE: usize = 25;

pub const DEFAULT_MYGENE_BASE_URL: &str = "https://mygene.info/v3";
pub const DEFAULT_MYGENE_BATCH_SIZE: usize = 500;
pub const DEFAULT_MYGENE_SPECIES: &str = "human";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const USER_AGENT: &str = concat!("ferronet/", env!("CARGO_PKG_VERSION"));

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// ============================================================================
// UniProt ID mapping
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniProtConfig {
    pub base_url: String,
    /// Wait before the first status poll
    pub poll_interval_ms: u64,
    /// Multiplier applied to the wait after every non-terminal poll
    pub backoff_factor: f64,
    pub max_poll_interval_ms: u64,
    pub max_polls: u32,
    /// Identifiers per submitted job
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for UniProtConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UNIPROT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_UNIPROT_POLL_INTERVAL_MS,
            backoff_factor: DEFAULT_UNIPROT_BACKOFF_FACTOR,
            max_poll_interval_ms: DEFAULT_UNIPROT_MAX_POLL_INTERVAL_MS,
            max_polls: DEFAULT_UNIPROT_MAX_POLLS,
            batch_size: DEFAULT_UNIPROT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl UniProtConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("UNIPROT_BASE_URL", DEFAULT_UNIPROT_BASE_URL),
            poll_interval_ms: env_or("UNIPROT_POLL_INTERVAL_MS", DEFAULT_UNIPROT_POLL_INTERVAL_MS),
            backoff_factor: env_or("UNIPROT_BACKOFF_FACTOR", DEFAULT_UNIPROT_BACKOFF_FACTOR),
            max_poll_interval_ms: env_or(
                "UNIPROT_MAX_POLL_INTERVAL_MS",
                DEFAULT_UNIPROT_MAX_POLL_INTERVAL_MS,
            ),
            max_polls: env_or("UNIPROT_MAX_POLLS", DEFAULT_UNIPROT_MAX_POLLS),
            batch_size: env_or("UNIPROT_BATCH_SIZE", DEFAULT_UNIPROT_BATCH_SIZE),
            timeout_secs: env_or("UNIPROT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            max_retries: env_or("UNIPROT_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(IngestError::config("UniProt base URL cannot be empty"));
        }
        if self.batch_size == 0 {
            return Err(IngestError::config("UniProt batch size must be greater than 0"));
        }
        if self.max_polls == 0 {
            return Err(IngestError::config("UniProt max polls must be greater than 0"));
        }
        if self.backoff_factor < 1.0 {
            return Err(IngestError::config("UniProt backoff factor must be at least 1.0"));
        }
        if self.timeout_secs == 0 {
            return Err(IngestError::config("Timeout must be greater than 0"));
        }
        Ok(())
    }
}

// ============================================================================
// MyGene
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyGeneConfig {
    pub base_url: String,
    pub species: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for MyGeneConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MYGENE_BASE_URL.to_string(),
            species: DEFAULT_MYGENE_SPECIES.to_string(),
            batch_size: DEFAULT_MYGENE_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl MyGeneConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("MYGENE_BASE_URL", DEFAULT_MYGENE_BASE_URL),
            species: env_string("MYGENE_SPECIES", DEFAULT_MYGENE_SPECIES),
            batch_size: env_or("MYGENE_BATCH_SIZE", DEFAULT_MYGENE_BATCH_SIZE),
            timeout_secs: env_or("MYGENE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            max_retries: env_or("MYGENE_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(IngestError::config("MyGene base URL cannot be empty"));
        }
        if self.batch_size == 0 {
            return Err(IngestError::config("MyGene batch size must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(IngestError::config("Timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// Shared HTTP client settings for the external services
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?)
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    /// Hop limit for layered expansion
    pub max_hops: usize,
    /// `source_db` tag whose protein nodes form the layering core
    pub core_source: String,
    pub uniprot: UniProtConfig,
    pub mygene: MyGeneConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_hops: DEFAULT_MAX_HOPS,
            core_source: DEFAULT_CORE_SOURCE.to_string(),
            uniprot: UniProtConfig::default(),
            mygene: MyGeneConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from the environment, reading `.env` first when present
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            output_dir: PathBuf::from(env_string("FERRONET_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            max_hops: env_or("FERRONET_MAX_HOPS", DEFAULT_MAX_HOPS),
            core_source: env_string("FERRONET_CORE_SOURCE", DEFAULT_CORE_SOURCE),
            uniprot: UniProtConfig::from_env(),
            mygene: MyGeneConfig::from_env(),
        }
    }

    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_hops == 0 {
            return Err(IngestError::config("max_hops must be at least 1"));
        }
        if self.core_source.trim().is_empty() {
            return Err(IngestError::config("Core source tag cannot be empty"));
        }
        self.uniprot.validate()?;
        self.mygene.validate()
    }
}

#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.config.max_hops = max_hops;
        self
    }

    pub fn core_source(mut self, source: impl Into<String>) -> Self {
        self.config.core_source = source.into();
        self
    }

    pub fn uniprot(mut self, uniprot: UniProtConfig) -> Self {
        self.config.uniprot = uniprot;
        self
    }

    pub fn mygene(mut self, mygene: MyGeneConfig) -> Self {
        self.config.mygene = mygene;
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_hops, 2);
        assert_eq!(config.uniprot.batch_size, 25);
        assert_eq!(config.core_source, "KEGG");
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert!(PipelineConfig::builder().max_hops(0).build().is_err());

        let uniprot = UniProtConfig {
            backoff_factor: 0.5,
            ..UniProtConfig::default()
        };
        assert!(PipelineConfig::builder().uniprot(uniprot).build().is_err());

        let config = PipelineConfig::builder()
            .max_hops(3)
            .core_source("KEGG|ferrdb")
            .build()
            .unwrap();
        assert_eq!(config.max_hops, 3);
    }
}
