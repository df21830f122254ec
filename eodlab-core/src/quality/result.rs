//! Validation outcome types.
//!
//! One stable result shape regardless of how an expectation was evaluated:
//! rule kind, target columns, a success flag and an optional structured
//! detail payload.

use super::expectation::ExpectationKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cap on sampled indices / values carried in a detail payload.
pub const PARTIAL_LIMIT: usize = 20;

/// Structured detail attached to a failing (or skipped) expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultDetail {
    /// Table columns differ from the expected set.
    ColumnSetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
        observed: Vec<String>,
    },
    /// Row-level violations with a sample of offending row indices.
    UnexpectedValues {
        unexpected_count: usize,
        element_count: usize,
        partial_unexpected_index: Vec<usize>,
    },
    TypeMismatch {
        expected: String,
        observed: String,
    },
    DuplicateKeys {
        duplicate_count: usize,
        partial_duplicates: Vec<String>,
    },
    RowCountOutOfRange {
        observed: usize,
        min: Option<usize>,
        max: Option<usize>,
    },
    ValuesOutsideSet {
        unexpected_count: usize,
        element_count: usize,
        partial_unexpected_list: Vec<String>,
    },
    /// Target column(s) absent; the expectation was not evaluated.
    ColumnsAbsent { columns: Vec<String> },
    /// The evaluation itself failed.
    EvaluationError { message: String },
}

impl fmt::Display for ResultDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultDetail::ColumnSetMismatch {
                missing,
                unexpected,
                ..
            } => write!(f, "missing {missing:?}, unexpected {unexpected:?}"),
            ResultDetail::UnexpectedValues {
                unexpected_count,
                element_count,
                partial_unexpected_index,
            } => write!(
                f,
                "{unexpected_count} of {element_count} rows unexpected (rows {partial_unexpected_index:?})"
            ),
            ResultDetail::TypeMismatch { expected, observed } => {
                write!(f, "expected {expected}, observed {observed}")
            }
            ResultDetail::DuplicateKeys {
                duplicate_count,
                partial_duplicates,
            } => write!(
                f,
                "{duplicate_count} rows share a key (e.g. {partial_duplicates:?})"
            ),
            ResultDetail::RowCountOutOfRange { observed, min, max } => {
                write!(f, "observed {observed} rows, expected ")?;
                match (min, max) {
                    (Some(lo), Some(hi)) => write!(f, "between {lo} and {hi}"),
                    (Some(lo), None) => write!(f, "at least {lo}"),
                    (None, Some(hi)) => write!(f, "at most {hi}"),
                    (None, None) => write!(f, "any"),
                }
            }
            ResultDetail::ValuesOutsideSet {
                unexpected_count,
                element_count,
                partial_unexpected_list,
            } => write!(
                f,
                "{unexpected_count} of {element_count} values outside set: {partial_unexpected_list:?}"
            ),
            ResultDetail::ColumnsAbsent { columns } => {
                write!(f, "not evaluated, column(s) absent: {columns:?}")
            }
            ResultDetail::EvaluationError { message } => write!(f, "evaluation error: {message}"),
        }
    }
}

/// Outcome of one expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub kind: ExpectationKind,
    /// Target columns; empty for table-level expectations.
    pub columns: Vec<String>,
    pub success: bool,
    /// False when the target column(s) were absent from the batch.
    pub evaluated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ResultDetail>,
}

impl ExpectationResult {
    pub fn passed(kind: ExpectationKind, columns: Vec<String>) -> Self {
        Self {
            kind,
            columns,
            success: true,
            evaluated: true,
            detail: None,
        }
    }

    pub fn failed(kind: ExpectationKind, columns: Vec<String>, detail: ResultDetail) -> Self {
        Self {
            kind,
            columns,
            success: false,
            evaluated: true,
            detail: Some(detail),
        }
    }

    /// Target columns are absent. Counted as passing: the column-set
    /// expectation is the one that reports the schema defect.
    pub fn skipped(kind: ExpectationKind, columns: Vec<String>, absent: Vec<String>) -> Self {
        Self {
            kind,
            columns,
            success: true,
            evaluated: false,
            detail: Some(ResultDetail::ColumnsAbsent { columns: absent }),
        }
    }

    /// `column` / `a, b` / `(table)` for display.
    pub fn target(&self) -> String {
        if self.columns.is_empty() {
            "(table)".to_string()
        } else {
            self.columns.join(", ")
        }
    }
}

/// Aggregate counts over a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub skipped_expectations: usize,
    pub success_percent: Option<f64>,
}

impl Statistics {
    pub fn from_results(results: &[ExpectationResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let skipped = results.iter().filter(|r| !r.evaluated).count();
        Self {
            evaluated_expectations: total,
            successful_expectations: successful,
            unsuccessful_expectations: total - successful,
            skipped_expectations: skipped,
            success_percent: (total > 0).then(|| successful as f64 / total as f64 * 100.0),
        }
    }
}

/// Result of running a suite against one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub suite_name: String,
    pub success: bool,
    pub results: Vec<ExpectationResult>,
    pub statistics: Statistics,
}

impl ValidationResult {
    pub fn new(suite_name: impl Into<String>, results: Vec<ExpectationResult>) -> Self {
        let statistics = Statistics::from_results(&results);
        Self {
            suite_name: suite_name.into(),
            success: statistics.unsuccessful_expectations == 0,
            results,
            statistics,
        }
    }

    /// Results that failed, in suite order.
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
