//! Pipeline configuration
//!
//! Read from a JSON file; every field has a default so a missing file or a
//! partial file is valid.
//!
//! ```json
//! {
//!   "feedstock_dir": "./feedstock",
//!   "validator": { "scroll_base": 1, "strict": false },
//!   "search": { "default_index": "mdf", "hard_cap": 10000 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving `<source_name>_all.json` feedstock files
    #[serde(default = "default_feedstock_dir")]
    pub feedstock_dir: PathBuf,

    /// Directory of `schema_<resource>.json` rule files (optional)
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Feedstock validator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_scroll_base")]
    pub scroll_base: u64,

    #[serde(default)]
    pub strict: bool,
}

/// Search service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding a bearer token (optional)
    #[serde(default)]
    pub token_env: Option<String>,

    #[serde(default = "default_index")]
    pub default_index: Option<String>,

    /// Human alias -> service-side index identifier
    #[serde(default = "default_index_aliases")]
    pub index_aliases: BTreeMap<String, String>,

    /// Most documents the service returns for one request
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,

    /// Limit for plain-text queries when none is given
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Requested scroll window width for aggregation
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_retries")]
    pub retries: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_feedstock_dir() -> PathBuf {
    PathBuf::from("./feedstock")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_scroll_base() -> u64 {
    1
}
fn default_base_url() -> String {
    "https://search.api.globus.org".to_string()
}
fn default_index() -> Option<String> {
    Some("mdf".to_string())
}
fn default_index_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "mdf".to_string(),
            "1a57bbe5-5272-477f-9d31-343b8258b7a5".to_string(),
        ),
        (
            "mdf-test".to_string(),
            "5acded0c-a534-45af-84be-dcf042e36412".to_string(),
        ),
    ])
}
fn default_hard_cap() -> usize {
    10000
}
fn default_limit() -> usize {
    10
}
fn default_window_size() -> usize {
    10000
}
fn default_retries() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            scroll_base: default_scroll_base(),
            strict: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: None,
            default_index: default_index(),
            index_aliases: default_index_aliases(),
            hard_cap: default_hard_cap(),
            default_limit: default_limit(),
            window_size: default_window_size(),
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feedstock_dir: default_feedstock_dir(),
            schema_dir: None,
            log_level: default_log_level(),
            validator: ValidatorConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.hard_cap == 0 {
            return Err(ConfigError::Invalid("search.hard_cap must be > 0".into()));
        }
        if self.search.window_size == 0 {
            return Err(ConfigError::Invalid("search.window_size must be > 0".into()));
        }
        self.log_severity().map(|_| ())
    }

    pub fn log_severity(&self) -> Result<Severity, ConfigError> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}
