//! The fixed end-of-day expectation suite.

use super::expectation::{Expectation, ValueType};
use crate::data::schema::COLUMNS;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUITE_NAME: &str = "stock_data_expectation_suite";

/// Symbols a valid table may contain.
pub const ALLOWED_SYMBOLS: [&str; 7] = ["AAPL", "MSFT", "AMZN", "GOOGL", "META", "NVDA", "TSLA"];

/// Columns that must be fully populated.
pub const NOT_NULL_COLUMNS: [&str; 5] = ["date", "symbol", "open", "close", "volume"];

/// Designated type per column.
pub const COLUMN_TYPES: [(&str, ValueType); 8] = [
    ("date", ValueType::Timestamp),
    ("symbol", ValueType::String),
    ("open", ValueType::Float64),
    ("high", ValueType::Float64),
    ("low", ValueType::Float64),
    ("close", ValueType::Float64),
    ("adj_close", ValueType::Float64),
    ("volume", ValueType::Int64),
];

/// A named, ordered collection of expectations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    name: String,
    expectations: Vec<Expectation>,
}

impl ExpectationSuite {
    pub fn new(name: impl Into<String>, expectations: Vec<Expectation>) -> Self {
        Self {
            name: name.into(),
            expectations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }
}

/// Build the end-of-day suite. Pure; same rules every call.
pub fn build_suite(name: &str) -> ExpectationSuite {
    let mut expectations = Vec::with_capacity(18);

    // Schema: exact column set, order-insensitive
    expectations.push(Expectation::TableColumnsToMatchSet {
        column_set: COLUMNS.iter().map(|c| c.to_string()).collect(),
    });

    // Completeness
    expectations.extend(NOT_NULL_COLUMNS.iter().map(|c| Expectation::ColumnValuesToNotBeNull {
        column: c.to_string(),
    }));

    // Types
    expectations.extend(COLUMN_TYPES.iter().map(|(c, t)| Expectation::ColumnValuesToBeOfType {
        column: c.to_string(),
        type_: *t,
    }));

    // Price relationship; strict, a flat high == low bar fails
    expectations.push(Expectation::ColumnPairValuesAToBeGreaterThanB {
        column_a: "high".into(),
        column_b: "low".into(),
        or_equal: false,
    });

    // Uniqueness & row count
    expectations.push(Expectation::CompoundColumnsToBeUnique {
        column_list: vec!["date".into(), "symbol".into()],
    });
    expectations.push(Expectation::TableRowCountToBeBetween {
        min_value: Some(1),
        max_value: None,
    });

    // Allowed symbols
    expectations.push(Expectation::ColumnValuesToBeInSet {
        column: "symbol".into(),
        value_set: ALLOWED_SYMBOLS.iter().map(|s| s.to_string()).collect(),
    });

    ExpectationSuite::new(name, expectations)
}
