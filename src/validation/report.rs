//! Validation Reporter: reduces many `ValidationResult`s into one
//! serializable report, and persists it as pretty JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::validator::ValidationResult;
use super::ValidationError;

/// Fields scoring below this are listed as problematic per document.
pub const PROBLEMATIC_FIELD_LIMIT: f64 = 80.0;

const NO_RESULTS_MESSAGE: &str = "No validation results to report";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub success_rate: f64,
    pub average_accuracy: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub filename: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedResult {
    pub filename: String,
    pub accuracy: f64,
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
    pub extra_fields: Vec<String>,
    pub problematic_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub summary: ReportSummary,
    pub best_performance: Performance,
    pub worst_performance: Performance,
    pub field_statistics: BTreeMap<String, FieldStatistics>,
    pub detailed_results: Vec<DetailedResult>,
}

/// Report or an explicit "nothing to report" marker.
///
/// The empty case serializes as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutcome {
    NoResults { error: String },
    Report(Box<ValidationReport>),
}

impl ReportOutcome {
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Report(r) => Some(&**r),
            Self::NoResults { .. } => None,
        }
    }
}

/// Aggregate validation results. Ties for best/worst go to the first
/// result encountered.
pub fn generate_report(results: &[ValidationResult], threshold: f64) -> ReportOutcome {
    let Some(first) = results.first() else {
        return ReportOutcome::NoResults {
            error: NO_RESULTS_MESSAGE.to_string(),
        };
    };

    let total = results.len();
    let valid = results.iter().filter(|r| r.passed).count();
    let average_accuracy = results.iter().map(|r| r.overall_score).sum::<f64>() / total as f64;

    let mut best = first;
    let mut worst = first;
    for result in &results[1..] {
        if result.overall_score > best.overall_score {
            best = result;
        }
        if result.overall_score < worst.overall_score {
            worst = result;
        }
    }

    ReportOutcome::Report(Box::new(ValidationReport {
        summary: ReportSummary {
            total,
            valid,
            invalid: total - valid,
            success_rate: valid as f64 / total as f64 * 100.0,
            average_accuracy,
            threshold,
        },
        best_performance: performance(best),
        worst_performance: performance(worst),
        field_statistics: field_statistics(results),
        detailed_results: results.iter().map(detailed).collect(),
    }))
}

/// Per-field mean/min/max, computed only over results where the field was scored.
fn field_statistics(results: &[ValidationResult]) -> BTreeMap<String, FieldStatistics> {
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        for field in &result.field_accuracies {
            samples.entry(field.field.as_str()).or_default().push(field.score);
        }
    }

    samples
        .into_iter()
        .map(|(field, scores)| {
            let n = scores.len();
            let stats = FieldStatistics {
                avg: scores.iter().sum::<f64>() / n as f64,
                min: scores.iter().copied().fold(f64::INFINITY, f64::min),
                max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                n,
            };
            (field.to_string(), stats)
        })
        .collect()
}

fn performance(result: &ValidationResult) -> Performance {
    Performance {
        filename: result.document_id.clone(),
        accuracy: result.overall_score,
    }
}

fn detailed(result: &ValidationResult) -> DetailedResult {
    DetailedResult {
        filename: result.document_id.clone(),
        accuracy: result.overall_score,
        is_valid: result.passed,
        missing_fields: result.missing_fields.iter().cloned().collect(),
        extra_fields: result.extra_fields.iter().cloned().collect(),
        problematic_fields: result.fields_below(PROBLEMATIC_FIELD_LIMIT),
    }
}

/// Default report file name for a run started now.
pub fn timestamped_report_name() -> String {
    format!(
        "validation_report_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Write the report as pretty JSON.
///
/// `target` is either a file path ending in `.json`, or a directory that
/// receives a timestamped file. Parent directories are created.
pub fn save_report(outcome: &ReportOutcome, target: &Path) -> Result<PathBuf, ValidationError> {
    let path = if target.extension().is_some_and(|e| e == "json") {
        target.to_path_buf()
    } else {
        target.join(timestamped_report_name())
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(outcome)?;
    std::fs::write(&path, json.as_bytes())?;

    tracing::info!(path = %path.display(), "Validation report saved");
    Ok(path)
}
