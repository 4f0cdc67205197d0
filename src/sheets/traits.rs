//! Workbook collaborator boundary.
//!
//! The engine never owns spreadsheet data. It reads and writes through this
//! trait; a Google Sheets client, a snapshot file or an in-memory fixture can
//! sit behind it. Every call is blocking and either returns or fails.

use super::columns::{read_range, ColumnRange};
use super::types::CellUpdate;
use super::SheetsError;
use crate::models::FieldValue;

pub trait Workbook {
    /// Tab names in the workbook's own order.
    fn tab_names(&self) -> Result<Vec<String>, SheetsError>;

    /// First row of a tab. Empty if the tab has no rows.
    fn read_header(&self, tab: &str) -> Result<Vec<FieldValue>, SheetsError>;

    /// All rows of a tab (header included), clipped to `range`.
    fn read_rows(&self, tab: &str, range: ColumnRange)
        -> Result<Vec<Vec<FieldValue>>, SheetsError>;

    /// Write every update in one batch. Returns the number of cells written.
    fn batch_write(&mut self, tab: &str, updates: &[CellUpdate]) -> Result<usize, SheetsError>;
}

/// Read a tab's rows, bounding the column range by its last labelled header.
pub fn load_tab(workbook: &dyn Workbook, tab: &str) -> Result<Vec<Vec<FieldValue>>, SheetsError> {
    let header = workbook.read_header(tab)?;
    let range = read_range(&header);
    if header.is_empty() {
        tracing::warn!(tab, range = %range, "No headers found, using default range");
    }

    let rows = workbook.read_rows(tab, range)?;
    tracing::debug!(tab, rows = rows.len(), range = %range, "Tab rows loaded");
    Ok(rows)
}
