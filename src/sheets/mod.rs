//! Spreadsheet reconciliation: locate a patient's row across every tab of a
//! workbook and write extracted results back into it.
//!
//! The workbook itself is a collaborator behind the [`Workbook`] trait.

pub mod columns;
pub mod error;
pub mod manual_entry;
pub mod mapping;
pub mod memory;
pub mod resolver;
pub mod traits;
pub mod types;
pub mod writer;

pub use columns::{find_column, index_to_letter, letter_to_index, CellRef, ColumnRange};
pub use error::{NotFoundReason, ResolveError, SheetsError};
pub use manual_entry::ManualEntryRow;
pub use mapping::{ColumnMapping, ColumnSlot, ValueTransform};
pub use memory::MemoryWorkbook;
pub use resolver::{PatientRowResolver, DEFAULT_IDENTITY_FRAGMENT};
pub use traits::{load_tab, Workbook};
pub use types::{CellUpdate, MatchCandidate, PatientLocation, SheetTab, WriteOutcome};
pub use writer::{plan_updates, RecordWriter};
