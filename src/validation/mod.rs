//! Scoring path: extracted fields → ground truth comparison → report.
//!
//! ```text
//! comparator::score_field → RecordValidator::validate → report::generate_report
//! ```

pub mod comparator;
pub mod expected;
pub mod report;
pub mod validator;

pub use comparator::{score, score_field};
pub use expected::{DirectoryExpectedStore, ExpectedDataStore, MemoryExpectedStore};
pub use report::{generate_report, save_report, ReportOutcome, ValidationReport};
pub use validator::{
    log_validation_summary, validate_results, FieldAccuracy, RecordValidator, ValidationResult,
    DEFAULT_ACCURACY_THRESHOLD,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
