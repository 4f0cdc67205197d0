pub mod config;
pub mod models;
pub mod pipeline;
pub mod sheets;
pub mod validation;

use std::collections::BTreeMap;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use config::EngineConfig;
use models::FieldMap;
use pipeline::{ExtractionSummary, PipelineError};
use sheets::{MemoryWorkbook, PatientRowResolver, RecordWriter};
use validation::{DirectoryExpectedStore, RecordValidator, ReportOutcome};

/// Load an extraction batch, score it against ground truth, then reconcile
/// it with the workbook snapshot when one is configured.
pub fn run() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = EngineConfig::from_env()?;
    let results = pipeline::load_extraction_results(config.require_results_path()?)?;
    ExtractionSummary::from_results(&results).log();

    score(&config, &results)?;

    match &config.workbook_path {
        Some(path) => reconcile(&config, path, &results)?,
        None => tracing::info!("No workbook configured, skipping reconciliation"),
    }
    Ok(())
}

fn score(config: &EngineConfig, results: &BTreeMap<String, FieldMap>) -> Result<(), PipelineError> {
    let store = DirectoryExpectedStore::new(&config.expected_data_dir);
    let validator = RecordValidator::new(config.accuracy_threshold);

    let validated = validation::validate_results(&validator, &store, results);
    validation::log_validation_summary(&validated);

    match validation::generate_report(&validated, validator.threshold()) {
        ReportOutcome::NoResults { error } => {
            tracing::warn!(reason = %error, "No files could be validated");
        }
        outcome => {
            validation::save_report(&outcome, &config.report_dir)?;
        }
    }
    Ok(())
}

fn reconcile(
    config: &EngineConfig,
    workbook_path: &Path,
    results: &BTreeMap<String, FieldMap>,
) -> Result<(), PipelineError> {
    let mut workbook = MemoryWorkbook::load(workbook_path)?;
    let resolver = PatientRowResolver::new(&config.identity_fragment);
    let writer = RecordWriter::new(config.column_mapping.clone());

    let summary = pipeline::run_batch(&resolver, &writer, &mut workbook, results);
    workbook.save(workbook_path)?;

    for (doc, row) in summary.manual_rows() {
        tracing::info!(
            doc,
            headers = %row.header_line(),
            values = %row.tsv.trim_end_matches('\n'),
            "Copy-paste values for manual entry"
        );
    }
    Ok(())
}
