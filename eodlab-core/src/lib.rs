//! EodLab Core: end-of-day ingestion and data-quality validation.
//!
//! - `data`: Marketstack fetch, normalization into a fixed-schema table,
//!   Parquet persistence
//! - `quality`: the end-of-day expectation suite, its runner and reporter
//! - `config`: TOML + dotenv settings

pub mod config;
pub mod data;
pub mod quality;
