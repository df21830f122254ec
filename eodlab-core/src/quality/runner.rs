//! Run a suite against one materialized batch.

use super::result::ValidationResult;
use super::suite::ExpectationSuite;
use polars::prelude::DataFrame;

/// Evaluate every expectation in `suite` against `table`.
///
/// Expectations are independent: a failure (or an evaluation error) in one
/// never prevents the rest from running.
pub fn validate(table: &DataFrame, suite: &ExpectationSuite) -> ValidationResult {
    let results: Vec<_> = suite
        .expectations()
        .iter()
        .map(|expectation| {
            let result = expectation.evaluate(table);
            if !result.success {
                tracing::debug!(
                    kind = %result.kind,
                    target = %result.target(),
                    "expectation failed"
                );
            }
            result
        })
        .collect();

    let validation = ValidationResult::new(suite.name(), results);
    tracing::info!(
        suite = suite.name(),
        rows = table.height(),
        success = validation.success,
        "Validation completed!"
    );
    validation
}
