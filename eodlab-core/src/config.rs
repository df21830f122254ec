//! Runtime settings: optional TOML file, dotenv files, process environment.
//!
//! Precedence, highest first: environment variables, the TOML file, built-in
//! defaults. The API key is only ever read from the environment (after the
//! dotenv files have been loaded into it).

use crate::data::marketstack::DEFAULT_BASE_URL;
use crate::data::store::DEFAULT_OUTPUT_DIR;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_VAR: &str = "MARKETSTACK_API_KEY";
pub const BASE_URL_VAR: &str = "MARKETSTACK_BASE_URL";

/// Dotenv files consulted, in order. Earlier files win.
pub const DOTENV_FILES: [&str; 2] = ["config.env", ".env"];

/// Tickers pulled when none are given.
pub const DEFAULT_TICKERS: [&str; 7] = ["AAPL", "MSFT", "AMZN", "NVDA", "GOOGL", "META", "TSLA"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk TOML layout.
///
/// ```toml
/// [marketstack]
/// base_url = "https://api.marketstack.com/v1"
/// tickers = ["AAPL", "MSFT"]
///
/// [storage]
/// output_dir = "data/raw"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub marketstack: MarketstackSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketstackSection {
    pub base_url: Option<String>,
    pub tickers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// `None` when unset; the remote side rejects the request, not us.
    pub api_key: Option<String>,
    pub base_url: String,
    pub tickers: Vec<String>,
    pub output_dir: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("tickers", &self.tickers)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), |_| None)
    }
}

impl Settings {
    /// Load settings for a CLI run.
    ///
    /// Reads the TOML file when given, loads the dotenv files into the
    /// process environment (never overriding variables already set), then
    /// resolves against the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        for name in DOTENV_FILES {
            if let Ok(path) = dotenvy::from_filename(name) {
                tracing::debug!("loaded environment from {}", path.display());
            }
        }

        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// Merge a file config with an environment lookup.
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = env(API_KEY_VAR).filter(|k| !k.is_empty());
        let base_url = env(BASE_URL_VAR)
            .filter(|u| !u.is_empty())
            .or(file.marketstack.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let tickers = file
            .marketstack
            .tickers
            .unwrap_or_else(|| DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect());
        let output_dir = file
            .storage
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Self {
            api_key,
            base_url,
            tickers,
            output_dir,
        }
    }
}
