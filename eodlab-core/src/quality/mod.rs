//! Data-quality expectations: suite construction, evaluation, reporting

pub mod expectation;
pub mod report;
pub mod result;
pub mod runner;
pub mod store;
pub mod suite;

pub use expectation::{Expectation, ExpectationKind, ValueType};
pub use report::{failures, render, summarize};
pub use result::{ExpectationResult, ResultDetail, Statistics, ValidationResult};
pub use runner::validate;
pub use store::{load_suite, save_suite, SuiteStoreError};
pub use suite::{build_suite, ExpectationSuite, ALLOWED_SYMBOLS, DEFAULT_SUITE_NAME};
