//! Declarative expectations and their evaluation against a batch.
//!
//! Each expectation is a (kind, target column(s), parameters) triple.
//! Evaluation never panics and never aborts: polars errors are folded into
//! a failing result, and column-level expectations whose target column is
//! missing are reported as not evaluated.

use super::result::{ExpectationResult, ResultDetail, PARTIAL_LIMIT};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Rule kind, named after the conventional expectation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectationKind {
    #[serde(rename = "expect_table_columns_to_match_set")]
    TableColumnsToMatchSet,
    #[serde(rename = "expect_column_values_to_not_be_null")]
    ColumnValuesToNotBeNull,
    #[serde(rename = "expect_column_values_to_be_of_type")]
    ColumnValuesToBeOfType,
    #[serde(rename = "expect_column_pair_values_a_to_be_greater_than_b")]
    ColumnPairValuesAToBeGreaterThanB,
    #[serde(rename = "expect_compound_columns_to_be_unique")]
    CompoundColumnsToBeUnique,
    #[serde(rename = "expect_table_row_count_to_be_between")]
    TableRowCountToBeBetween,
    #[serde(rename = "expect_column_values_to_be_in_set")]
    ColumnValuesToBeInSet,
}

impl ExpectationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableColumnsToMatchSet => "expect_table_columns_to_match_set",
            Self::ColumnValuesToNotBeNull => "expect_column_values_to_not_be_null",
            Self::ColumnValuesToBeOfType => "expect_column_values_to_be_of_type",
            Self::ColumnPairValuesAToBeGreaterThanB => {
                "expect_column_pair_values_a_to_be_greater_than_b"
            }
            Self::CompoundColumnsToBeUnique => "expect_compound_columns_to_be_unique",
            Self::TableRowCountToBeBetween => "expect_table_row_count_to_be_between",
            Self::ColumnValuesToBeInSet => "expect_column_values_to_be_in_set",
        }
    }
}

impl fmt::Display for ExpectationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic column type checked by [`Expectation::ColumnValuesToBeOfType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Any `Datetime` time unit, with or without a time zone.
    Timestamp,
    String,
    Float64,
    Int64,
}

impl ValueType {
    pub fn matches(&self, dtype: &DataType) -> bool {
        match self {
            ValueType::Timestamp => matches!(dtype, DataType::Datetime(_, _)),
            ValueType::String => matches!(dtype, DataType::String),
            ValueType::Float64 => matches!(dtype, DataType::Float64),
            ValueType::Int64 => matches!(dtype, DataType::Int64),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Timestamp => "timestamp",
            ValueType::String => "str",
            ValueType::Float64 => "f64",
            ValueType::Int64 => "i64",
        };
        f.write_str(name)
    }
}

/// One declarative data-quality rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    /// Column names, as a set, equal `column_set`.
    TableColumnsToMatchSet { column_set: Vec<String> },
    /// No null (or NaN) values.
    ColumnValuesToNotBeNull { column: String },
    ColumnValuesToBeOfType { column: String, type_: ValueType },
    /// `column_a > column_b` row-wise (`>=` when `or_equal`).
    ColumnPairValuesAToBeGreaterThanB {
        column_a: String,
        column_b: String,
        or_equal: bool,
    },
    CompoundColumnsToBeUnique { column_list: Vec<String> },
    TableRowCountToBeBetween {
        min_value: Option<usize>,
        max_value: Option<usize>,
    },
    /// Non-null values are members of `value_set`.
    ColumnValuesToBeInSet {
        column: String,
        value_set: Vec<String>,
    },
}

impl Expectation {
    pub fn kind(&self) -> ExpectationKind {
        match self {
            Expectation::TableColumnsToMatchSet { .. } => ExpectationKind::TableColumnsToMatchSet,
            Expectation::ColumnValuesToNotBeNull { .. } => ExpectationKind::ColumnValuesToNotBeNull,
            Expectation::ColumnValuesToBeOfType { .. } => ExpectationKind::ColumnValuesToBeOfType,
            Expectation::ColumnPairValuesAToBeGreaterThanB { .. } => {
                ExpectationKind::ColumnPairValuesAToBeGreaterThanB
            }
            Expectation::CompoundColumnsToBeUnique { .. } => {
                ExpectationKind::CompoundColumnsToBeUnique
            }
            Expectation::TableRowCountToBeBetween { .. } => {
                ExpectationKind::TableRowCountToBeBetween
            }
            Expectation::ColumnValuesToBeInSet { .. } => ExpectationKind::ColumnValuesToBeInSet,
        }
    }

    /// Columns this expectation reads; empty for table-level rules.
    pub fn columns(&self) -> Vec<String> {
        match self {
            Expectation::TableColumnsToMatchSet { .. }
            | Expectation::TableRowCountToBeBetween { .. } => Vec::new(),
            Expectation::ColumnValuesToNotBeNull { column }
            | Expectation::ColumnValuesToBeOfType { column, .. }
            | Expectation::ColumnValuesToBeInSet { column, .. } => vec![column.clone()],
            Expectation::ColumnPairValuesAToBeGreaterThanB {
                column_a, column_b, ..
            } => vec![column_a.clone(), column_b.clone()],
            Expectation::CompoundColumnsToBeUnique { column_list } => column_list.clone(),
        }
    }

    /// Evaluate against `df`. Always returns a result.
    pub fn evaluate(&self, df: &DataFrame) -> ExpectationResult {
        let kind = self.kind();
        let columns = self.columns();

        let absent: Vec<String> = columns
            .iter()
            .filter(|c| df.column(c.as_str()).is_err())
            .cloned()
            .collect();
        if !absent.is_empty() {
            return ExpectationResult::skipped(kind, columns, absent);
        }

        match self.check(df) {
            Ok(None) => ExpectationResult::passed(kind, columns),
            Ok(Some(detail)) => ExpectationResult::failed(kind, columns, detail),
            Err(e) => ExpectationResult::failed(
                kind,
                columns,
                ResultDetail::EvaluationError {
                    message: e.to_string(),
                },
            ),
        }
    }

    /// `Ok(None)` on success, `Ok(Some(detail))` on a violation.
    fn check(&self, df: &DataFrame) -> PolarsResult<Option<ResultDetail>> {
        match self {
            Expectation::TableColumnsToMatchSet { column_set } => {
                Ok(check_column_set(df, column_set))
            }
            Expectation::ColumnValuesToNotBeNull { column } => {
                check_not_null(df.column(column)?)
            }
            Expectation::ColumnValuesToBeOfType { column, type_ } => {
                let dtype = df.column(column)?.dtype();
                Ok((!type_.matches(dtype)).then(|| ResultDetail::TypeMismatch {
                    expected: type_.to_string(),
                    observed: dtype.to_string(),
                }))
            }
            Expectation::ColumnPairValuesAToBeGreaterThanB {
                column_a,
                column_b,
                or_equal,
            } => check_pair_greater(df.column(column_a)?, df.column(column_b)?, *or_equal),
            Expectation::CompoundColumnsToBeUnique { column_list } => {
                check_compound_unique(df, column_list)
            }
            Expectation::TableRowCountToBeBetween {
                min_value,
                max_value,
            } => {
                let observed = df.height();
                let too_few = min_value.is_some_and(|lo| observed < lo);
                let too_many = max_value.is_some_and(|hi| observed > hi);
                Ok((too_few || too_many).then_some(ResultDetail::RowCountOutOfRange {
                    observed,
                    min: *min_value,
                    max: *max_value,
                }))
            }
            Expectation::ColumnValuesToBeInSet { column, value_set } => {
                check_in_set(df.column(column)?, value_set)
            }
        }
    }
}

// ── Checks ──────────────────────────────────────────────────────────

fn check_column_set(df: &DataFrame, column_set: &[String]) -> Option<ResultDetail> {
    let observed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let expected: BTreeSet<&str> = column_set.iter().map(String::as_str).collect();
    let actual: BTreeSet<&str> = observed.iter().map(String::as_str).collect();

    let missing: Vec<String> = expected.difference(&actual).map(|s| s.to_string()).collect();
    let unexpected: Vec<String> = actual.difference(&expected).map(|s| s.to_string()).collect();

    if missing.is_empty() && unexpected.is_empty() {
        None
    } else {
        Some(ResultDetail::ColumnSetMismatch {
            missing,
            unexpected,
            observed,
        })
    }
}

fn check_not_null(column: &Column) -> PolarsResult<Option<ResultDetail>> {
    let missing: Vec<bool> = if column.dtype().is_float() {
        let floats = column.cast(&DataType::Float64)?;
        floats
            .f64()?
            .into_iter()
            .map(|v| v.map_or(true, f64::is_nan))
            .collect()
    } else {
        column
            .as_materialized_series()
            .is_null()
            .into_iter()
            .map(|v| v.unwrap_or(true))
            .collect()
    };

    let unexpected: Vec<usize> = missing
        .iter()
        .enumerate()
        .filter_map(|(i, &is_missing)| is_missing.then_some(i))
        .collect();

    Ok(unexpected_values(unexpected, missing.len()))
}

/// Rows where both sides are missing are ignored; one missing side is a violation.
fn check_pair_greater(
    a: &Column,
    b: &Column,
    or_equal: bool,
) -> PolarsResult<Option<ResultDetail>> {
    let a = a.cast(&DataType::Float64)?;
    let b = b.cast(&DataType::Float64)?;

    let mut element_count = 0;
    let mut unexpected = Vec::new();
    for (i, (x, y)) in a.f64()?.into_iter().zip(b.f64()?.into_iter()).enumerate() {
        let ok = match (x, y) {
            (None, None) => continue,
            (Some(x), Some(y)) if or_equal => x >= y,
            (Some(x), Some(y)) => x > y,
            _ => false,
        };
        element_count += 1;
        if !ok {
            unexpected.push(i);
        }
    }

    Ok(unexpected_values(unexpected, element_count))
}

/// Rows where every key column is missing are ignored.
fn check_compound_unique(
    df: &DataFrame,
    column_list: &[String],
) -> PolarsResult<Option<ResultDetail>> {
    let keys: Vec<Column> = column_list
        .iter()
        .map(|c| df.column(c)?.cast(&DataType::String))
        .collect::<PolarsResult<_>>()?;
    let keys: Vec<&StringChunked> = keys.iter().map(|c| c.str()).collect::<PolarsResult<_>>()?;

    // key -> (first row seen, occurrences)
    let mut seen: HashMap<Vec<Option<&str>>, (usize, usize)> = HashMap::new();
    for i in 0..df.height() {
        let key: Vec<Option<&str>> = keys.iter().map(|ca| ca.get(i)).collect();
        if key.iter().all(Option::is_none) {
            continue;
        }
        seen.entry(key).or_insert((i, 0)).1 += 1;
    }

    let mut duplicates: Vec<(usize, usize, Vec<Option<&str>>)> = seen
        .into_iter()
        .filter(|(_, (_, n))| *n > 1)
        .map(|(key, (first, n))| (first, n, key))
        .collect();
    if duplicates.is_empty() {
        return Ok(None);
    }
    duplicates.sort_by_key(|(first, _, _)| *first);

    let duplicate_count = duplicates.iter().map(|(_, n, _)| n).sum();
    let partial_duplicates = duplicates
        .iter()
        .take(PARTIAL_LIMIT)
        .map(|(_, _, key)| {
            key.iter()
                .map(|v| v.unwrap_or("null"))
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();

    Ok(Some(ResultDetail::DuplicateKeys {
        duplicate_count,
        partial_duplicates,
    }))
}

/// Nulls are ignored; completeness is a separate expectation.
fn check_in_set(column: &Column, value_set: &[String]) -> PolarsResult<Option<ResultDetail>> {
    let allowed: HashSet<&str> = value_set.iter().map(String::as_str).collect();
    let values = column.cast(&DataType::String)?;

    let mut element_count = 0;
    let mut unexpected_count = 0;
    let mut partial: Vec<String> = Vec::new();
    for v in values.str()?.into_iter().flatten() {
        element_count += 1;
        if allowed.contains(v) {
            continue;
        }
        unexpected_count += 1;
        if partial.len() < PARTIAL_LIMIT && !partial.iter().any(|p| p == v) {
            partial.push(v.to_string());
        }
    }

    Ok((unexpected_count > 0).then_some(ResultDetail::ValuesOutsideSet {
        unexpected_count,
        element_count,
        partial_unexpected_list: partial,
    }))
}

fn unexpected_values(unexpected: Vec<usize>, element_count: usize) -> Option<ResultDetail> {
    if unexpected.is_empty() {
        return None;
    }
    Some(ResultDetail::UnexpectedValues {
        unexpected_count: unexpected.len(),
        element_count,
        partial_unexpected_index: unexpected.into_iter().take(PARTIAL_LIMIT).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> DataFrame {
        df!(
            "symbol" => &[Some("AAPL"), Some("MSFT"), None],
            "high" => &[Some(105.0), Some(100.0), None],
            "low" => &[Some(99.0), Some(100.0), None],
            "close" => &[Some(103.0), Some(f64::NAN), Some(1.0)],
        )
        .unwrap()
    }

    #[test]
    fn kind_names_follow_expectation_identifiers() {
        let e = Expectation::ColumnValuesToNotBeNull {
            column: "date".into(),
        };
        assert_eq!(e.kind().to_string(), "expect_column_values_to_not_be_null");
        assert_eq!(
            serde_json::to_string(&e.kind()).unwrap(),
            "\"expect_column_values_to_not_be_null\""
        );
    }

    #[test]
    fn not_null_counts_nan_as_missing() {
        let result = Expectation::ColumnValuesToNotBeNull {
            column: "close".into(),
        }
        .evaluate(&prices());

        assert!(!result.success);
        assert_eq!(
            result.detail,
            Some(ResultDetail::UnexpectedValues {
                unexpected_count: 1,
                element_count: 3,
                partial_unexpected_index: vec![1],
            })
        );
    }

    #[test]
    fn not_null_on_strings() {
        let result = Expectation::ColumnValuesToNotBeNull {
            column: "symbol".into(),
        }
        .evaluate(&prices());
        assert!(!result.success);
    }

    #[test]
    fn pair_is_strict_and_ignores_double_nulls() {
        let strict = Expectation::ColumnPairValuesAToBeGreaterThanB {
            column_a: "high".into(),
            column_b: "low".into(),
            or_equal: false,
        }
        .evaluate(&prices());
        assert_eq!(
            strict.detail,
            Some(ResultDetail::UnexpectedValues {
                unexpected_count: 1,
                element_count: 2,
                partial_unexpected_index: vec![1],
            })
        );

        let loose = Expectation::ColumnPairValuesAToBeGreaterThanB {
            column_a: "high".into(),
            column_b: "low".into(),
            or_equal: true,
        }
        .evaluate(&prices());
        assert!(loose.success);
    }

    #[test]
    fn pair_with_one_missing_side_fails() {
        let df = df!(
            "high" => &[Some(1.0), None],
            "low" => &[Some(0.5), Some(0.1)],
        )
        .unwrap();
        let result = Expectation::ColumnPairValuesAToBeGreaterThanB {
            column_a: "high".into(),
            column_b: "low".into(),
            or_equal: false,
        }
        .evaluate(&df);
        assert!(!result.success);
    }

    #[test]
    fn compound_unique_reports_duplicate_keys() {
        let df = df!(
            "date" => &["2025-01-03", "2025-01-03", "2025-01-03", "2025-01-06"],
            "symbol" => &["AAPL", "MSFT", "AAPL", "AAPL"],
        )
        .unwrap();
        let result = Expectation::CompoundColumnsToBeUnique {
            column_list: vec!["date".into(), "symbol".into()],
        }
        .evaluate(&df);

        assert_eq!(
            result.detail,
            Some(ResultDetail::DuplicateKeys {
                duplicate_count: 2,
                partial_duplicates: vec!["2025-01-03/AAPL".into()],
            })
        );
    }

    #[test]
    fn in_set_ignores_nulls_and_dedupes_sample() {
        let df = df!("symbol" => &[Some("AAPL"), Some("SPY"), Some("SPY"), None]).unwrap();
        let result = Expectation::ColumnValuesToBeInSet {
            column: "symbol".into(),
            value_set: vec!["AAPL".into()],
        }
        .evaluate(&df);

        assert_eq!(
            result.detail,
            Some(ResultDetail::ValuesOutsideSet {
                unexpected_count: 2,
                element_count: 3,
                partial_unexpected_list: vec!["SPY".into()],
            })
        );
    }

    #[test]
    fn type_check_reports_observed_dtype() {
        let result = Expectation::ColumnValuesToBeOfType {
            column: "high".into(),
            type_: ValueType::Int64,
        }
        .evaluate(&prices());
        assert_eq!(
            result.detail,
            Some(ResultDetail::TypeMismatch {
                expected: "i64".into(),
                observed: "f64".into(),
            })
        );
    }

    #[test]
    fn timestamp_accepts_any_unit() {
        for unit in [
            TimeUnit::Milliseconds,
            TimeUnit::Microseconds,
            TimeUnit::Nanoseconds,
        ] {
            assert!(ValueType::Timestamp.matches(&DataType::Datetime(unit, None)));
        }
        assert!(!ValueType::Timestamp.matches(&DataType::String));
        assert!(!ValueType::Timestamp.matches(&DataType::Date));
    }

    #[test]
    fn missing_target_is_skipped_not_failed() {
        let result = Expectation::ColumnValuesToNotBeNull {
            column: "volume".into(),
        }
        .evaluate(&prices());
        assert!(result.success);
        assert!(!result.evaluated);
        assert_eq!(
            result.detail,
            Some(ResultDetail::ColumnsAbsent {
                columns: vec!["volume".into()]
            })
        );
    }

    #[test]
    fn row_count_bounds() {
        let e = Expectation::TableRowCountToBeBetween {
            min_value: Some(1),
            max_value: Some(2),
        };
        assert!(!e.evaluate(&prices()).success);
        assert!(e.evaluate(&prices().head(Some(2))).success);
        assert!(!e.evaluate(&prices().head(Some(0))).success);
    }

    #[test]
    fn expectation_json_is_tagged() {
        let e = Expectation::ColumnValuesToBeOfType {
            column: "volume".into(),
            type_: ValueType::Int64,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(
            json,
            r#"{"type":"column_values_to_be_of_type","column":"volume","type_":"int64"}"#
        );
    }
}
