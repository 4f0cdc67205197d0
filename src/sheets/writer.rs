//! Record Writer: turns a resolved patient row and an extracted field map
//! into one batch of typed cell writes.

use super::columns::{find_column, CellRef};
use super::mapping::ColumnMapping;
use super::traits::Workbook;
use super::types::{CellUpdate, PatientLocation, WriteOutcome};
use super::SheetsError;
use crate::models::{FieldMap, FieldValue};

/// Plan the cell writes for one row against a header row.
///
/// A mapped field contributes an update only when its column is present in
/// the header and its value is non-null. Values keep their numeric type.
pub fn plan_updates(
    header: &[FieldValue],
    row: usize,
    fields: &FieldMap,
    mapping: &ColumnMapping,
) -> Vec<CellUpdate> {
    let mut updates = Vec::new();
    for mapped in mapping.fields() {
        let Some(column) = find_column(header, mapped.label) else {
            tracing::debug!(field = %mapped.key, label = mapped.label, "Column not found, skipping field");
            continue;
        };
        let Some(value) = mapped.value_from(fields) else {
            continue;
        };
        updates.push(CellUpdate {
            cell: CellRef { column, row },
            value,
        });
    }
    updates
}

#[derive(Debug, Clone, Default)]
pub struct RecordWriter {
    mapping: ColumnMapping,
}

impl RecordWriter {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Read the tab's header and plan the writes for `row`.
    pub fn build_updates(
        &self,
        workbook: &dyn Workbook,
        tab: &str,
        row: usize,
        fields: &FieldMap,
    ) -> Result<Vec<CellUpdate>, SheetsError> {
        let header = workbook.read_header(tab)?;
        if header.is_empty() {
            tracing::warn!(tab, "Cannot plan updates: sheet has no header row");
            return Ok(Vec::new());
        }
        Ok(plan_updates(&header, row, fields, &self.mapping))
    }

    /// Write a patient's results into their row in a single batch.
    pub fn write(
        &self,
        workbook: &mut dyn Workbook,
        location: &PatientLocation,
        fields: &FieldMap,
    ) -> Result<WriteOutcome, SheetsError> {
        let updates = self.build_updates(&*workbook, &location.tab, location.row, fields)?;
        if updates.is_empty() {
            tracing::warn!(tab = %location.tab, row = location.row, "No data to update");
            return Ok(WriteOutcome::NoOp);
        }

        let cells = workbook.batch_write(&location.tab, &updates)?;
        tracing::info!(
            tab = %location.tab,
            row = location.row,
            cells,
            "Patient row updated"
        );
        Ok(WriteOutcome::Written { cells })
    }
}
