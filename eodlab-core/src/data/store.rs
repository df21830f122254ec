//! Parquet persistence for normalized tables.
//!
//! One file per pull, no partitioning, no append. Writes go to
//! `{destination}.tmp` first and are renamed into place, so an existing file
//! is replaced whole.

use super::provider::DataError;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory pulled tables are written under.
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw";

/// Write `table` to `destination`, creating parent directories as needed.
///
/// An existing file at `destination` is silently overwritten.
pub fn persist(table: &DataFrame, destination: &Path) -> Result<(), DataError> {
    let persistence_err = |reason: String| DataError::Persistence {
        path: destination.to_path_buf(),
        reason,
    };

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| persistence_err(format!("failed to create dir: {e}")))?;
    }

    let tmp_path = tmp_path_for(destination);
    let file =
        fs::File::create(&tmp_path).map_err(|e| persistence_err(format!("create file: {e}")))?;
    if let Err(e) = ParquetWriter::new(file).finish(&mut table.clone()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(persistence_err(format!("write parquet: {e}")));
    }

    fs::rename(&tmp_path, destination).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        persistence_err(format!("atomic rename failed: {e}"))
    })?;

    tracing::info!(rows = table.height(), "Saved to {}", destination.display());
    Ok(())
}

/// Load a Parquet file into memory as one batch.
pub fn load_table(path: &Path) -> Result<DataFrame, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }
    let file = fs::File::open(path).map_err(|e| DataError::Parquet(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read {}: {e}", path.display())))?;

    tracing::debug!(rows = df.height(), cols = df.width(), "loaded {}", path.display());
    Ok(df)
}

/// Resolve an output file name against the output directory.
///
/// Absolute names are used as-is.
pub fn output_path(output_dir: &Path, filename: impl AsRef<Path>) -> PathBuf {
    output_dir.join(filename)
}

fn tmp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
