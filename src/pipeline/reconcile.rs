//! Reconciliation path: extracted fields → patient row → write-back, or a
//! manual-entry row when the engine must not write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{FieldKey, FieldMap};
use crate::sheets::{
    ManualEntryRow, PatientLocation, PatientRowResolver, RecordWriter, Workbook, WriteOutcome,
};

// ═══════════════════════════════════════════════════════════
// Outcomes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The patient's row received `cells` values.
    Updated {
        location: PatientLocation,
        cells: usize,
    },
    /// The row was found but no mapped field had both a column and a value.
    Unchanged { location: PatientLocation },
    /// Not found, ambiguous or unwritable: the operator pastes `row` by hand.
    Manual { reason: String, row: ManualEntryRow },
    /// Nothing to reconcile (extraction failed or the patient name is missing).
    Skipped { reason: String },
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Unchanged { .. } => "unchanged",
            Self::Manual { .. } => "manual",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Reconcile one document against the workbook.
///
/// Never fails: every lookup or write problem is folded into the outcome so
/// the rest of the batch still runs.
pub fn reconcile_document(
    resolver: &PatientRowResolver,
    writer: &RecordWriter,
    workbook: &mut dyn Workbook,
    document_id: &str,
    fields: &FieldMap,
) -> ReconcileOutcome {
    if let Some(marker) = fields.error() {
        tracing::warn!(doc = %document_id, error = %marker, "Skipping reconciliation due to extraction error");
        return ReconcileOutcome::Skipped {
            reason: marker.to_string(),
        };
    }

    let (Some(first), Some(last)) = (fields.text(FieldKey::Nombre), fields.text(FieldKey::Apellidos))
    else {
        tracing::warn!(doc = %document_id, "Skipping reconciliation, patient name missing");
        return ReconcileOutcome::Skipped {
            reason: "Patient name missing from extraction".into(),
        };
    };

    let manual = |reason: String| {
        tracing::info!(doc = %document_id, reason = %reason, "Falling back to manual entry");
        ReconcileOutcome::Manual {
            reason,
            row: ManualEntryRow::build(fields, writer.mapping()),
        }
    };

    let location = match resolver.resolve(&*workbook, first, last) {
        Ok(location) => location,
        Err(e) => {
            if !e.is_lookup_outcome() {
                tracing::error!(doc = %document_id, error = %e, "Patient search failed");
            }
            return manual(e.to_string());
        }
    };

    match writer.write(workbook, &location, fields) {
        Ok(WriteOutcome::Written { cells }) => ReconcileOutcome::Updated { location, cells },
        Ok(WriteOutcome::NoOp) => ReconcileOutcome::Unchanged { location },
        Err(e) => {
            tracing::error!(
                doc = %document_id,
                tab = %location.tab,
                row = location.row,
                error = %e,
                "Error updating spreadsheet"
            );
            manual(format!("Error updating sheet '{}': {}", location.tab, e))
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Batch
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcomes: BTreeMap<String, ReconcileOutcome>,
}

impl BatchSummary {
    pub fn count(&self, label: &str) -> usize {
        self.outcomes.values().filter(|o| o.label() == label).count()
    }

    pub fn manual_rows(&self) -> impl Iterator<Item = (&str, &ManualEntryRow)> {
        self.outcomes.iter().filter_map(|(doc, o)| match o {
            ReconcileOutcome::Manual { row, .. } => Some((doc.as_str(), row)),
            _ => None,
        })
    }
}

/// Reconcile every document of an extraction batch, one at a time.
pub fn run_batch(
    resolver: &PatientRowResolver,
    writer: &RecordWriter,
    workbook: &mut dyn Workbook,
    extraction_results: &BTreeMap<String, FieldMap>,
) -> BatchSummary {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(run = %run_id, documents = extraction_results.len(), "Reconciliation started");

    let outcomes: BTreeMap<String, ReconcileOutcome> = extraction_results
        .iter()
        .map(|(doc, fields)| {
            let outcome = reconcile_document(resolver, writer, workbook, doc, fields);
            tracing::info!(run = %run_id, doc = %doc, outcome = outcome.label(), "Document reconciled");
            (doc.clone(), outcome)
        })
        .collect();

    let summary = BatchSummary {
        run_id,
        started_at,
        outcomes,
    };
    tracing::info!(
        run = %run_id,
        updated = summary.count("updated"),
        unchanged = summary.count("unchanged"),
        manual = summary.count("manual"),
        skipped = summary.count("skipped"),
        "Reconciliation complete"
    );
    summary
}
