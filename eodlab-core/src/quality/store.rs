//! Optional on-disk copy of a suite, for tooling outside this crate.
//!
//! Runs never read the stored copy back implicitly; the suite is rebuilt
//! from code every invocation.

use super::suite::ExpectationSuite;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuiteStoreError {
    #[error("suite I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("suite JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Path a suite is stored under: `{dir}/{name}.json`.
///
/// Path separators in the name are replaced so the file stays in `dir`.
pub fn suite_path(dir: &Path, name: &str) -> PathBuf {
    let file: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    dir.join(format!("{file}.json"))
}

/// Save `suite` as pretty JSON, replacing any previous copy.
pub fn save_suite(dir: &Path, suite: &ExpectationSuite) -> Result<PathBuf, SuiteStoreError> {
    let path = suite_path(dir, suite.name());
    let io_err = |source| SuiteStoreError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let json = serde_json::to_string_pretty(suite).map_err(|source| SuiteStoreError::Json {
        path: path.clone(),
        source,
    })?;
    let replaced = path.exists();
    fs::write(&path, json).map_err(io_err)?;

    if replaced {
        tracing::info!("Expectation suite '{}' saved successfully.", suite.name());
    } else {
        tracing::info!("Expectation suite '{}' added successfully.", suite.name());
    }
    Ok(path)
}

pub fn load_suite(path: &Path) -> Result<ExpectationSuite, SuiteStoreError> {
    let content = fs::read_to_string(path).map_err(|source| SuiteStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SuiteStoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
