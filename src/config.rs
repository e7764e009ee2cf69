use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::generation::{DEFAULT_ARTIST_BATCH_SIZE, gemini};
use crate::store::{local, remote};

/// Which playlist store to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// JSON document on local disk
    Local,
    /// REST playlist backend
    Remote,
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub api_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub local_db_dir: PathBuf,
    pub network_delay: Duration,
    pub artist_batch_size: usize,
    pub token: Option<String>,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Build a config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("CURATOR_BACKEND") {
            Some(raw) => <BackendKind as ValueEnum>::from_str(&raw, true)
                .map_err(|e| anyhow::anyhow!("Invalid CURATOR_BACKEND '{raw}': {e}"))?,
            None => BackendKind::Local,
        };
        let network_delay = match var("NETWORK_DELAY_MS") {
            Some(raw) => Duration::from_millis(
                u64::from_str(raw.trim())
                    .with_context(|| format!("Invalid NETWORK_DELAY_MS '{raw}'"))?,
            ),
            None => local::DEFAULT_LATENCY,
        };
        let artist_batch_size = match var("ARTIST_BATCH_SIZE") {
            Some(raw) => usize::from_str(raw.trim())
                .with_context(|| format!("Invalid ARTIST_BATCH_SIZE '{raw}'"))?,
            None => DEFAULT_ARTIST_BATCH_SIZE,
        };

        Ok(Config {
            backend,
            api_base_url: var("API_BASE_URL").unwrap_or_else(|| remote::DEFAULT_BASE_URL.to_string()),
            gemini_api_key: var("GEMINI_API_KEY").or_else(|| var("API_KEY")),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            local_db_dir: var("LOCAL_DB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".playlist-curator")),
            network_delay,
            artist_batch_size,
            token: var("MUSIC_TOKEN"),
        })
    }
}
