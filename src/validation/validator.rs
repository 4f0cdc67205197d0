//! Record Validator: scores one document's extracted fields against its
//! expected fields.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::comparator::{score_field, MAX_SCORE};
use super::expected::ExpectedDataStore;
use crate::models::{FieldKey, FieldMap, FieldValue};

pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 80.0;

/// Score of a single field in the union of expected and actual keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAccuracy {
    pub field: String,
    pub expected: FieldValue,
    pub actual: FieldValue,
    pub score: f64,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub document_id: String,
    pub overall_score: f64,
    /// Every scored field, known fields in vocabulary order then extras.
    pub field_accuracies: Vec<FieldAccuracy>,
    /// The subset of `field_accuracies` scoring below 100.
    pub differences: Vec<FieldAccuracy>,
    pub missing_fields: BTreeSet<String>,
    pub extra_fields: BTreeSet<String>,
    pub passed: bool,
}

impl ValidationResult {
    pub fn field_score(&self, field: &str) -> Option<f64> {
        self.field_accuracies
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.score)
    }

    /// Fields scoring strictly below `limit`, in scoring order.
    pub fn fields_below(&self, limit: f64) -> Vec<String> {
        self.field_accuracies
            .iter()
            .filter(|f| f.score < limit)
            .map(|f| f.field.clone())
            .collect()
    }
}

/// Compares extracted field maps against expected ones.
#[derive(Debug, Clone)]
pub struct RecordValidator {
    accuracy_threshold: f64,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY_THRESHOLD)
    }
}

impl RecordValidator {
    pub fn new(accuracy_threshold: f64) -> Self {
        Self { accuracy_threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.accuracy_threshold
    }

    /// Validate one document.
    ///
    /// The caller must not pass an `actual` map carrying an extraction
    /// failure marker; see [`validate_results`].
    pub fn validate(
        &self,
        document_id: &str,
        expected: &FieldMap,
        actual: &FieldMap,
    ) -> ValidationResult {
        let expected_names = expected.field_names();
        let actual_names = actual.field_names();

        // Union in first-seen order: expected layout first, then actual-only keys.
        let mut universe: Vec<String> = expected_names.clone();
        for name in &actual_names {
            if !expected.contains(name) {
                universe.push(name.clone());
            }
        }

        let field_accuracies: Vec<FieldAccuracy> = universe
            .into_iter()
            .map(|field| {
                let expected_val = expected.get_raw(&field).cloned().unwrap_or_default();
                let actual_val = actual.get_raw(&field).cloned().unwrap_or_default();
                let kind = FieldKey::from_str(&field).map(|k| k.kind());
                let score = score_field(kind, &expected_val, &actual_val);
                FieldAccuracy {
                    field,
                    expected: expected_val,
                    actual: actual_val,
                    score,
                }
            })
            .collect();

        let overall_score = if field_accuracies.is_empty() {
            0.0
        } else {
            field_accuracies.iter().map(|f| f.score).sum::<f64>() / field_accuracies.len() as f64
        };

        let differences = field_accuracies
            .iter()
            .filter(|f| f.score < MAX_SCORE)
            .cloned()
            .collect();

        let expected_set: BTreeSet<String> = expected_names.into_iter().collect();
        let actual_set: BTreeSet<String> = actual_names.into_iter().collect();

        ValidationResult {
            document_id: document_id.to_string(),
            overall_score,
            field_accuracies,
            differences,
            missing_fields: expected_set.difference(&actual_set).cloned().collect(),
            extra_fields: actual_set.difference(&expected_set).cloned().collect(),
            passed: overall_score >= self.accuracy_threshold,
        }
    }
}

/// Validate a batch of extraction results, in document order.
///
/// Documents carrying an extraction failure marker are skipped (the marker
/// is logged unchanged), as are documents with no expected data. Neither
/// aborts the batch.
pub fn validate_results(
    validator: &RecordValidator,
    store: &dyn ExpectedDataStore,
    extraction_results: &BTreeMap<String, FieldMap>,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();

    for (document_id, extracted) in extraction_results {
        if let Some(marker) = extracted.error() {
            tracing::warn!(
                doc = %document_id,
                error = %marker,
                "Skipping validation due to extraction error"
            );
            continue;
        }

        let Some(expected) = store.load(document_id) else {
            tracing::warn!(doc = %document_id, "Skipping validation, no expected data found");
            continue;
        };

        let result = validator.validate(document_id, &expected, extracted);
        tracing::info!(
            doc = %document_id,
            accuracy = result.overall_score,
            passed = result.passed,
            "Validation complete"
        );
        results.push(result);
    }

    results
}

/// Log a human-readable summary of a batch, one line per document.
pub fn log_validation_summary(results: &[ValidationResult]) {
    if results.is_empty() {
        tracing::info!("No validation results available");
        return;
    }

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let average = results.iter().map(|r| r.overall_score).sum::<f64>() / total as f64;

    tracing::info!(
        total,
        passed,
        failed = total - passed,
        average_accuracy = average,
        success_rate = passed as f64 / total as f64 * 100.0,
        "Validation summary"
    );

    for result in results {
        tracing::info!(
            doc = %result.document_id,
            accuracy = result.overall_score,
            status = if result.passed { "PASS" } else { "FAIL" },
            missing = ?result.missing_fields,
            extra = ?result.extra_fields,
            low_accuracy = ?result.fields_below(super::report::PROBLEMATIC_FIELD_LIMIT),
            "Document result"
        );
    }
}
