use polars::prelude::*;

/// Column order of a normalized end-of-day table.
pub const COLUMNS: [&str; 8] = [
    "date",
    "symbol",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "adj_close",
];

/// Canonical end-of-day table schema
pub struct EodSchema;

impl EodSchema {
    /// Unit used for the `date` column on write.
    pub const DATE_UNIT: TimeUnit = TimeUnit::Milliseconds;

    /// Get the canonical schema, in column order
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Datetime(Self::DATE_UNIT, None)),
            Field::new("symbol".into(), DataType::String),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new("volume".into(), DataType::Int64),
            Field::new("adj_close".into(), DataType::Float64),
        ])
    }

    /// Zero-row table carrying the canonical schema
    pub fn empty() -> DataFrame {
        DataFrame::empty_with_schema(&Self::schema())
    }

    /// True when `df` has exactly the canonical columns, in order, with canonical dtypes
    pub fn conforms(df: &DataFrame) -> bool {
        let expected = Self::schema();
        df.width() == expected.len()
            && df
                .get_columns()
                .iter()
                .zip(expected.iter_fields())
                .all(|(col, field)| col.name() == field.name() && col.dtype() == field.dtype())
    }
}
