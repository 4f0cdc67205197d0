//! Error types for the reconciliation path.
//!
//! `SheetsError` is a collaborator failure (I/O, missing tab). `ResolveError`
//! is a lookup outcome the caller recovers from by falling back to manual entry.

use thiserror::Error;

use super::types::MatchCandidate;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Sheet not found: {0}")]
    TabNotFound(String),

    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    #[error("Spreadsheet service error: {0}")]
    Service(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a patient search produced no candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Both name parts were blank; there is nothing to search for.
    BlankName,
    /// The workbook has no tabs at all.
    NoTabs,
    /// Tabs exist but none has an identity column.
    NoIdentityColumn { tabs: usize },
    /// No tab could be searched and at least one failed to read.
    TabsUnreadable { failed: usize, tabs: usize },
    /// Identity columns were scanned, no row matched.
    NoMatchingRow { tabs_searched: usize },
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => f.write_str("patient name is blank"),
            Self::NoTabs => f.write_str("no sheets found in spreadsheet"),
            Self::NoIdentityColumn { tabs } => {
                write!(f, "none of {tabs} sheets has an identity column")
            }
            Self::TabsUnreadable { failed, tabs } => {
                write!(f, "{failed} of {tabs} sheets could not be read")
            }
            Self::NoMatchingRow { tabs_searched } => {
                write!(f, "not found in any of {tabs_searched} searched sheets")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Patient not found: {identity} ({reason})")]
    NotFound {
        identity: String,
        reason: NotFoundReason,
    },

    #[error("Multiple patients found with same name: {identity} (locations: {})", join_locations(.locations))]
    Ambiguous {
        identity: String,
        locations: Vec<MatchCandidate>,
    },

    #[error("Error searching for patient: {0}")]
    Workbook(#[from] SheetsError),
}

impl ResolveError {
    /// Not-found and ambiguous outcomes are routine; the caller falls back
    /// to manual entry. A workbook failure is not.
    pub fn is_lookup_outcome(&self) -> bool {
        !matches!(self, Self::Workbook(_))
    }
}

fn join_locations(locations: &[MatchCandidate]) -> String {
    locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
