//! Data provider trait and structured error types.
//!
//! The EodProvider trait abstracts over the remote end-of-day source so the
//! pull pipeline can be driven by a canned provider in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Raw end-of-day record as delivered by the provider (before normalization).
///
/// Every field is optional on the wire; missing values survive as `None` and
/// are left for the quality suite to flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEodRecord {
    pub date: Option<String>,
    pub symbol: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    /// Marketstack reports volume as a float; integers deserialize fine too.
    pub volume: Option<f64>,
    pub adj_close: Option<f64>,
}

/// One bounded end-of-day request.
#[derive(Debug, Clone, PartialEq)]
pub struct EodRequest {
    pub symbols: Vec<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Page size.
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}

impl EodRequest {
    pub const DEFAULT_LIMIT: u32 = 1000;

    pub fn new(symbols: Vec<String>, date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            symbols,
            date_from,
            date_to,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI context without further wrapping.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("API request failed: {status} - {body}")]
    RemoteRequest { status: u16, body: String },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("failed to write {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("dataframe error: {0}")]
    Frame(String),
}

/// Trait for end-of-day data providers.
///
/// Implementations issue exactly one request per call; there is no retry
/// or pagination loop above this trait.
pub trait EodProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch raw end-of-day records for the request window.
    fn fetch_eod(
        &self,
        api_key: Option<&str>,
        request: &EodRequest,
    ) -> Result<Vec<RawEodRecord>, DataError>;
}

/// Fetch through any provider, logging the outcome.
pub fn fetch(
    provider: &dyn EodProvider,
    api_key: Option<&str>,
    request: &EodRequest,
) -> Result<Vec<RawEodRecord>, DataError> {
    tracing::info!(
        provider = provider.name(),
        symbols = %request.symbols.join(","),
        from = %request.date_from,
        to = %request.date_to,
        "fetching end-of-day records"
    );
    match provider.fetch_eod(api_key, request) {
        Ok(records) => {
            tracing::info!("Successfully fetched {} records", records.len());
            Ok(records)
        }
        Err(e) => {
            tracing::error!("{e}");
            Err(e)
        }
    }
}
