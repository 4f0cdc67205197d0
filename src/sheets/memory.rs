//! In-memory workbook, optionally backed by a JSON snapshot file.
//!
//! Snapshot format:
//! ```json
//! {"tabs": [{"name": "2024", "rows": [["NOMBRE", "FILIACION"], ["JUAN", "JUAN GARCIA"]]}]}
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::columns::ColumnRange;
use super::traits::Workbook;
use super::types::{CellUpdate, SheetTab};
use super::SheetsError;
use crate::models::FieldValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryWorkbook {
    #[serde(default)]
    tabs: Vec<SheetTab>,
}

impl MemoryWorkbook {
    pub fn new(tabs: Vec<SheetTab>) -> Self {
        Self { tabs }
    }

    pub fn load(path: &Path) -> Result<Self, SheetsError> {
        let raw = std::fs::read_to_string(path)?;
        let workbook: Self = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            tabs = workbook.tabs.len(),
            "Workbook snapshot loaded"
        );
        Ok(workbook)
    }

    pub fn save(&self, path: &Path) -> Result<(), SheetsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json.as_bytes())?;
        tracing::debug!(path = %path.display(), "Workbook snapshot saved");
        Ok(())
    }

    pub fn tab(&self, name: &str) -> Option<&SheetTab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    fn tab_mut(&mut self, name: &str) -> Result<&mut SheetTab, SheetsError> {
        self.tabs
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| SheetsError::TabNotFound(name.to_string()))
    }

    fn existing_tab(&self, name: &str) -> Result<&SheetTab, SheetsError> {
        self.tab(name)
            .ok_or_else(|| SheetsError::TabNotFound(name.to_string()))
    }
}

impl Workbook for MemoryWorkbook {
    fn tab_names(&self) -> Result<Vec<String>, SheetsError> {
        Ok(self.tabs.iter().map(|t| t.name.clone()).collect())
    }

    fn read_header(&self, tab: &str) -> Result<Vec<FieldValue>, SheetsError> {
        Ok(self.existing_tab(tab)?.header().to_vec())
    }

    fn read_rows(
        &self,
        tab: &str,
        range: ColumnRange,
    ) -> Result<Vec<Vec<FieldValue>>, SheetsError> {
        let tab = self.existing_tab(tab)?;
        Ok(tab
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| range.contains(*i))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect())
    }

    fn batch_write(&mut self, tab: &str, updates: &[CellUpdate]) -> Result<usize, SheetsError> {
        let sheet = self.tab_mut(tab)?;
        for update in updates {
            let row_index = update
                .cell
                .row
                .checked_sub(1)
                .ok_or_else(|| SheetsError::InvalidCell(update.range(tab)))?;

            if sheet.rows.len() <= row_index {
                sheet.rows.resize_with(row_index + 1, Vec::new);
            }
            let row = &mut sheet.rows[row_index];
            if row.len() <= update.cell.column {
                row.resize(update.cell.column + 1, FieldValue::Null);
            }
            row[update.cell.column] = update.value.clone();
        }
        Ok(updates.len())
    }
}
