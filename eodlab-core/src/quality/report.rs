//! Human-readable summary of a validation run.

use super::result::{ExpectationResult, ValidationResult};
use std::fmt::Write;

/// `(passed, total)` over all expectations.
pub fn summarize(result: &ValidationResult) -> (usize, usize) {
    let passed = result.results.iter().filter(|r| r.success).count();
    (passed, result.results.len())
}

/// Failing expectations, in suite order.
pub fn failures(result: &ValidationResult) -> Vec<&ExpectationResult> {
    result.failures().collect()
}

/// Render the pass/fail tally plus one line per failing expectation.
pub fn render(result: &ValidationResult) -> String {
    let (passed, total) = summarize(result);
    let mut out = String::new();

    let _ = writeln!(out, "Suite: {}", result.suite_name);
    let _ = writeln!(out, "Successful expectations: {passed} / {total}");

    if passed < total {
        let _ = writeln!(out, "Failed expectations:");
        for r in failures(result) {
            let _ = writeln!(out, "  - {}", describe(r));
        }
    }

    let skipped: Vec<&ExpectationResult> = result.results.iter().filter(|r| !r.evaluated).collect();
    if !skipped.is_empty() {
        let _ = writeln!(out, "Not evaluated:");
        for r in skipped {
            let _ = writeln!(out, "  - {}", describe(r));
        }
    }

    out
}

fn describe(r: &ExpectationResult) -> String {
    match &r.detail {
        Some(detail) => format!("{} [{}]: {detail}", r.kind, r.target()),
        None => format!("{} [{}]", r.kind, r.target()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::expectation::ExpectationKind;
    use crate::quality::result::ResultDetail;

    fn result(results: Vec<ExpectationResult>) -> ValidationResult {
        ValidationResult::new("stock_data_expectation_suite", results)
    }

    #[test]
    fn all_passing_renders_tally_only() {
        let r = result(vec![ExpectationResult::passed(
            ExpectationKind::TableRowCountToBeBetween,
            vec![],
        )]);
        assert_eq!(summarize(&r), (1, 1));
        assert_eq!(
            render(&r),
            "Suite: stock_data_expectation_suite\nSuccessful expectations: 1 / 1\n"
        );
    }

    #[test]
    fn failing_rules_are_itemized() {
        let r = result(vec![
            ExpectationResult::passed(ExpectationKind::TableRowCountToBeBetween, vec![]),
            ExpectationResult::failed(
                ExpectationKind::ColumnValuesToBeInSet,
                vec!["symbol".into()],
                ResultDetail::ValuesOutsideSet {
                    unexpected_count: 1,
                    element_count: 2,
                    partial_unexpected_list: vec!["SPY".into()],
                },
            ),
        ]);

        assert_eq!(summarize(&r), (1, 2));
        let text = render(&r);
        assert!(text.contains("Successful expectations: 1 / 2"));
        assert!(text.contains(
            "  - expect_column_values_to_be_in_set [symbol]: 1 of 2 values outside set: [\"SPY\"]"
        ));
        assert_eq!(failures(&r).len(), 1);
    }

    #[test]
    fn skipped_rules_listed_separately() {
        let r = result(vec![ExpectationResult::skipped(
            ExpectationKind::ColumnValuesToNotBeNull,
            vec!["open".into()],
            vec!["open".into()],
        )]);
        let text = render(&r);
        assert!(text.contains("Successful expectations: 1 / 1"));
        assert!(!text.contains("Failed expectations"));
        assert!(text.contains("Not evaluated:"));
    }
}
