//! Reshape raw provider records into the canonical eight-column table.
//!
//! Normalization only reshapes and orders. It never drops or rejects rows on
//! content: nulls, inverted bars, duplicates and unknown symbols all pass
//! through so the quality suite can report them.

use super::provider::{DataError, RawEodRecord};
use super::schema::EodSchema;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

/// Build a sorted eight-column table from raw records.
pub fn normalize(records: &[RawEodRecord]) -> Result<DataFrame, DataError> {
    if records.is_empty() {
        return Ok(EodSchema::empty());
    }

    let dates: Vec<Option<i64>> = records
        .iter()
        .map(|r| {
            let raw = r.date.as_deref()?;
            let parsed = parse_date(raw);
            if parsed.is_none() {
                tracing::warn!(date = raw, symbol = ?r.symbol, "unparseable date, stored as null");
            }
            parsed.map(date_to_millis)
        })
        .collect();
    let symbols: Vec<Option<&str>> = records.iter().map(|r| r.symbol.as_deref()).collect();
    let opens: Vec<Option<f64>> = records.iter().map(|r| r.open).collect();
    let highs: Vec<Option<f64>> = records.iter().map(|r| r.high).collect();
    let lows: Vec<Option<f64>> = records.iter().map(|r| r.low).collect();
    let closes: Vec<Option<f64>> = records.iter().map(|r| r.close).collect();
    let volumes: Vec<Option<i64>> = records
        .iter()
        .map(|r| r.volume.filter(|v| v.is_finite()).map(|v| v.round() as i64))
        .collect();
    let adj_closes: Vec<Option<f64>> = records.iter().map(|r| r.adj_close).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Datetime(EodSchema::DATE_UNIT, None))
            .map_err(|e| DataError::Frame(format!("date cast: {e}")))?,
        Column::new("symbol".into(), symbols),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("adj_close".into(), adj_closes),
    ])
    .map_err(|e| DataError::Frame(format!("dataframe creation: {e}")))?;

    sort_by_key(df)
}

/// Sort by `(date, symbol)` ascending; stable, nulls first.
pub fn sort_by_key(df: DataFrame) -> Result<DataFrame, DataError> {
    df.lazy()
        .sort(
            ["date", "symbol"],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, false])
                .with_maintain_order(true),
        )
        .collect()
        .map_err(|e| DataError::Frame(format!("sort: {e}")))
}

/// Parse the date formats Marketstack is known to emit.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS+0000` and RFC 3339. The time
/// component is discarded; the calendar date is taken as written.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Read the `date` column back as calendar dates.
pub fn calendar_dates(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, DataError> {
    let column = df
        .column("date")
        .map_err(|e| DataError::Frame(format!("date column: {e}")))?;
    let unit = match column.dtype() {
        DataType::Datetime(unit, _) => *unit,
        other => {
            return Err(DataError::Frame(format!(
                "date column has dtype {other}, expected datetime"
            )))
        }
    };
    let raw = column
        .cast(&DataType::Int64)
        .map_err(|e| DataError::Frame(format!("date column cast: {e}")))?;
    let ca = raw
        .i64()
        .map_err(|e| DataError::Frame(format!("date column type: {e}")))?;

    Ok(ca
        .iter()
        .map(|v| {
            v.and_then(|raw| match unit {
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(raw),
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(raw)),
            })
            .map(|dt| dt.date_naive())
        })
        .collect())
}
