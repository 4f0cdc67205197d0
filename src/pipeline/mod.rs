//! Document pipeline: extraction batch in, validation and reconciliation out.
//!
//! ```text
//! process_input ──► BTreeMap<doc, FieldMap> ──┬─► validation::validate_results
//!                                             └─► reconcile::run_batch
//! ```

pub mod extract;
pub mod reconcile;

pub use extract::{
    load_extraction_results, process_input, save_extraction_results, DocumentExtractor,
    ExtractionSummary,
};
pub use reconcile::{reconcile_document, run_batch, BatchSummary, ReconcileOutcome};

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::sheets::SheetsError;
use crate::validation::ValidationError;

/// Failure reported by a [`DocumentExtractor`] for one document.
///
/// Recorded in the batch as the document's error marker; never aborts it.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction service error: {0}")]
    Service(String),

    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Spreadsheet error: {0}")]
    Sheets(#[from] SheetsError),
}
