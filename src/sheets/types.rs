//! Core types for spreadsheet reconciliation.

use serde::{Deserialize, Deserializer, Serialize};

use super::columns::CellRef;
use crate::models::FieldValue;

/// One tab of a workbook. `rows[0]` is the header row (spreadsheet row 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetTab {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_cells")]
    pub rows: Vec<Vec<FieldValue>>,
}

// Spreadsheet exports write checkbox cells as JSON booleans.
fn deserialize_cells<'de, D>(deserializer: D) -> Result<Vec<Vec<FieldValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<serde_json::Value>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|row| row.iter().map(FieldValue::from_json).collect())
        .collect())
}

impl SheetTab {
    pub fn new(name: &str, rows: Vec<Vec<FieldValue>>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }

    /// Build a tab from plain text cells; empty strings become blank cells.
    pub fn from_text(name: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            FieldValue::Null
                        } else {
                            FieldValue::Text(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    pub fn header(&self) -> &[FieldValue] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell by 1-based row and 0-based column. Out-of-range reads are blank.
    pub fn cell(&self, row: usize, column: usize) -> &FieldValue {
        const BLANK: &FieldValue = &FieldValue::Null;
        row.checked_sub(1)
            .and_then(|r| self.rows.get(r))
            .and_then(|r| r.get(column))
            .unwrap_or(BLANK)
    }
}

/// A (tab, row) where the identity column matched. `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub tab: String,
    pub row: usize,
}

impl std::fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' row {}", self.tab, self.row)
    }
}

/// The single unambiguous location of a patient in the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientLocation {
    pub tab: String,
    pub row: usize,
    pub message: String,
}

impl From<MatchCandidate> for PatientLocation {
    fn from(candidate: MatchCandidate) -> Self {
        let message = format!(
            "Patient found in sheet '{}' at row {}",
            candidate.tab, candidate.row
        );
        Self {
            tab: candidate.tab,
            row: candidate.row,
            message,
        }
    }
}

/// One pending cell write. Values keep their original type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellUpdate {
    pub cell: CellRef,
    pub value: FieldValue,
}

impl CellUpdate {
    /// Fully qualified range, e.g. `'2024'!D2`.
    pub fn range(&self, tab: &str) -> String {
        format!("'{}'!{}", tab, self.cell)
    }
}

/// Result of a write-back attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// No mapped field had both a column and a value; nothing was sent.
    NoOp,
    Written { cells: usize },
}
