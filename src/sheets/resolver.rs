//! Patient Row Resolver: finds the one row, across every tab, whose
//! identity column holds the patient's full name.
//!
//! The data source does not guarantee name order, so both `"first last"`
//! and `"last first"` count as a match. The resolver never guesses: more
//! than one matching row anywhere in the workbook is an ambiguity the
//! caller must hand to a human.

use super::columns::find_column;
use super::error::{NotFoundReason, ResolveError};
use super::traits::{load_tab, Workbook};
use super::types::{MatchCandidate, PatientLocation};

/// Header fragment marking the patient identity ("filiación") column.
pub const DEFAULT_IDENTITY_FRAGMENT: &str = "FILIACION";

/// How a single tab contributed to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TabScan {
    Empty,
    NoIdentityColumn,
    Failed,
    Searched(Vec<MatchCandidate>),
}

/// Lower-cased, trimmed identity strings accepted for a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientIdentity {
    pub forward: String,
    pub reversed: String,
}

impl PatientIdentity {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            forward: normalize(&format!("{first_name} {last_name}")),
            reversed: normalize(&format!("{last_name} {first_name}")),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn matches(&self, cell_text: &str) -> bool {
        let cell = normalize(cell_text);
        !cell.is_empty() && (cell == self.forward || cell == self.reversed)
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase().trim().to_string()
}

#[derive(Debug, Clone)]
pub struct PatientRowResolver {
    identity_fragment: String,
}

impl Default for PatientRowResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FRAGMENT)
    }
}

impl PatientRowResolver {
    pub fn new(identity_fragment: &str) -> Self {
        Self {
            identity_fragment: identity_fragment.to_string(),
        }
    }

    /// Resolve a patient to exactly one (tab, row).
    ///
    /// A tab that fails to load is logged and contributes no candidates.
    /// Only a failure to list the tabs themselves aborts the search.
    pub fn resolve(
        &self,
        workbook: &dyn Workbook,
        first_name: &str,
        last_name: &str,
    ) -> Result<PatientLocation, ResolveError> {
        let identity = PatientIdentity::new(first_name, last_name);
        if identity.is_blank() {
            return Err(ResolveError::NotFound {
                identity: identity.forward,
                reason: NotFoundReason::BlankName,
            });
        }

        let tabs = workbook.tab_names()?;
        if tabs.is_empty() {
            tracing::warn!("No sheets found in spreadsheet");
            return Err(ResolveError::NotFound {
                identity: identity.forward,
                reason: NotFoundReason::NoTabs,
            });
        }

        tracing::info!(
            forward = %identity.forward,
            reversed = %identity.reversed,
            tabs = tabs.len(),
            "Searching for patient across sheets"
        );

        let mut candidates: Vec<MatchCandidate> = Vec::new();
        let mut tabs_searched = 0usize;
        let mut tabs_failed = 0usize;

        for tab in &tabs {
            match self.scan_tab(workbook, tab, &identity) {
                TabScan::Searched(found) => {
                    tabs_searched += 1;
                    candidates.extend(found);
                }
                TabScan::Failed => tabs_failed += 1,
                TabScan::Empty | TabScan::NoIdentityColumn => {}
            }
        }

        match candidates.len() {
            0 => {
                let reason = if tabs_searched == 0 && tabs_failed > 0 {
                    NotFoundReason::TabsUnreadable {
                        failed: tabs_failed,
                        tabs: tabs.len(),
                    }
                } else if tabs_searched == 0 {
                    NotFoundReason::NoIdentityColumn { tabs: tabs.len() }
                } else {
                    NotFoundReason::NoMatchingRow { tabs_searched }
                };
                tracing::info!(identity = %identity.forward, %reason, "Patient not found");
                Err(ResolveError::NotFound {
                    identity: identity.forward,
                    reason,
                })
            }
            1 => {
                let location = PatientLocation::from(candidates.remove(0));
                tracing::info!(tab = %location.tab, row = location.row, "Patient located");
                Ok(location)
            }
            n => {
                tracing::warn!(
                    identity = %identity.forward,
                    matches = n,
                    "Multiple patients found with same name"
                );
                Err(ResolveError::Ambiguous {
                    identity: identity.forward,
                    locations: candidates,
                })
            }
        }
    }

    fn scan_tab(&self, workbook: &dyn Workbook, tab: &str, identity: &PatientIdentity) -> TabScan {
        let rows = match load_tab(workbook, tab) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(tab, error = %e, "Error searching sheet, skipping");
                return TabScan::Failed;
            }
        };

        let Some(header) = rows.first() else {
            tracing::debug!(tab, "Sheet is empty, skipping");
            return TabScan::Empty;
        };

        let Some(identity_col) = find_column(header, &self.identity_fragment) else {
            tracing::debug!(
                tab,
                fragment = %self.identity_fragment,
                "No identity column found in sheet, skipping"
            );
            return TabScan::NoIdentityColumn;
        };

        let found: Vec<MatchCandidate> = rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, row)| {
                row.get(identity_col)
                    .is_some_and(|cell| identity.matches(&cell.to_cell_text()))
            })
            .map(|(i, _)| MatchCandidate {
                tab: tab.to_string(),
                row: i + 1,
            })
            .collect();

        for candidate in &found {
            tracing::debug!(tab, row = candidate.row, "Identity match");
        }

        TabScan::Searched(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::sheets::columns::ColumnRange;
    use crate::sheets::memory::MemoryWorkbook;
    use crate::sheets::types::{CellUpdate, SheetTab};
    use crate::sheets::SheetsError;

    const HEADER: &[&str] = &["NOMBRE", "APELLIDOS", "FILIACION", "Hb (g/dl) 12-18", "Hto (%) 36-50"];

    fn multi_tab_workbook() -> MemoryWorkbook {
        MemoryWorkbook::new(vec![
            SheetTab::from_text(
                "2024",
                &[
                    HEADER,
                    &["JUAN", "GARCIA LOPEZ", "JUAN GARCIA LOPEZ", "", ""],
                    &["MARIA", "RODRIGUEZ SANCHEZ", "MARIA RODRIGUEZ SANCHEZ", "", ""],
                    &["PEDRO", "MARTINEZ GARCIA", "PEDRO MARTINEZ GARCIA", "", ""],
                ],
            ),
            SheetTab::from_text(
                "2023",
                &[
                    HEADER,
                    &["ANA", "LOPEZ MARTINEZ", "ANA LOPEZ MARTINEZ", "", ""],
                    &["CARLOS", "SANCHEZ RUIZ", "CARLOS SANCHEZ RUIZ", "", ""],
                ],
            ),
            SheetTab::from_text(
                "Pending",
                &[HEADER, &["MIGUEL", "TORRES LOPEZ", "MIGUEL TORRES LOPEZ", "", ""]],
            ),
            SheetTab::from_text(
                "Archive",
                &[HEADER, &["JOSE", "GARCIA RODRIGUEZ", "JOSE GARCIA RODRIGUEZ", "", ""]],
            ),
        ])
    }

    fn duplicate_workbook() -> MemoryWorkbook {
        MemoryWorkbook::new(vec![
            SheetTab::from_text(
                "2024",
                &[HEADER, &["DUPLICATE", "PATIENT", "DUPLICATE PATIENT", "", ""]],
            ),
            SheetTab::from_text(
                "2023",
                &[HEADER, &["DUPLICATE", "PATIENT", "DUPLICATE PATIENT", "", ""]],
            ),
        ])
    }

    /// Wraps a workbook and fails reads of the listed tabs.
    struct FlakyWorkbook {
        inner: MemoryWorkbook,
        broken_tabs: &'static [&'static str],
    }

    impl Workbook for FlakyWorkbook {
        fn tab_names(&self) -> Result<Vec<String>, SheetsError> {
            self.inner.tab_names()
        }

        fn read_header(&self, tab: &str) -> Result<Vec<FieldValue>, SheetsError> {
            if self.broken_tabs.contains(&tab) {
                return Err(SheetsError::Service("HTTP 503".into()));
            }
            self.inner.read_header(tab)
        }

        fn read_rows(
            &self,
            tab: &str,
            range: ColumnRange,
        ) -> Result<Vec<Vec<FieldValue>>, SheetsError> {
            self.inner.read_rows(tab, range)
        }

        fn batch_write(
            &mut self,
            tab: &str,
            updates: &[CellUpdate],
        ) -> Result<usize, SheetsError> {
            self.inner.batch_write(tab, updates)
        }
    }

    struct UnreachableWorkbook;

    impl Workbook for UnreachableWorkbook {
        fn tab_names(&self) -> Result<Vec<String>, SheetsError> {
            Err(SheetsError::Service("credentials rejected".into()))
        }
        fn read_header(&self, _tab: &str) -> Result<Vec<FieldValue>, SheetsError> {
            unreachable!()
        }
        fn read_rows(
            &self,
            _tab: &str,
            _range: ColumnRange,
        ) -> Result<Vec<Vec<FieldValue>>, SheetsError> {
            unreachable!()
        }
        fn batch_write(
            &mut self,
            _tab: &str,
            _updates: &[CellUpdate],
        ) -> Result<usize, SheetsError> {
            unreachable!()
        }
    }

    #[test]
    fn finds_patient_in_first_tab() {
        let loc = PatientRowResolver::default()
            .resolve(&multi_tab_workbook(), "JUAN", "GARCIA LOPEZ")
            .unwrap();
        assert_eq!((loc.tab.as_str(), loc.row), ("2024", 2));
        assert!(loc.message.contains("'2024'") && loc.message.contains("row 2"));
    }

    #[test]
    fn finds_patient_in_later_tabs() {
        let wb = multi_tab_workbook();
        let resolver = PatientRowResolver::default();

        let loc = resolver.resolve(&wb, "CARLOS", "SANCHEZ RUIZ").unwrap();
        assert_eq!((loc.tab.as_str(), loc.row), ("2023", 3));

        let loc = resolver.resolve(&wb, "JOSE", "GARCIA RODRIGUEZ").unwrap();
        assert_eq!((loc.tab.as_str(), loc.row), ("Archive", 2));
    }

    #[test]
    fn reversed_name_order_matches_same_row() {
        let wb = MemoryWorkbook::new(vec![
            SheetTab::from_text("2024", &[&["FILIACION"], &["JUAN GARCIA"]]),
            SheetTab::from_text("2023", &[&["FILIACION"], &["OTRO PACIENTE"]]),
        ]);
        let resolver = PatientRowResolver::default();

        let forward = resolver.resolve(&wb, "JUAN", "GARCIA").unwrap();
        let reversed = resolver.resolve(&wb, "GARCIA", "JUAN").unwrap();
        assert_eq!(forward, reversed);
        assert_eq!((forward.tab.as_str(), forward.row), ("2024", 2));
    }

    #[test]
    fn match_ignores_case_and_padding() {
        let wb = MemoryWorkbook::new(vec![SheetTab::from_text(
            "2024",
            &[&["Filiación / FILIACION"], &["  juan garcia  "]],
        )]);
        let loc = PatientRowResolver::default()
            .resolve(&wb, "Juan", "Garcia")
            .unwrap();
        assert_eq!(loc.row, 2);
    }

    #[test]
    fn duplicates_across_tabs_are_ambiguous() {
        let err = PatientRowResolver::default()
            .resolve(&duplicate_workbook(), "DUPLICATE", "PATIENT")
            .unwrap_err();

        match err {
            ResolveError::Ambiguous { identity, locations } => {
                assert_eq!(identity, "duplicate patient");
                assert_eq!(
                    locations,
                    vec![
                        MatchCandidate { tab: "2024".into(), row: 2 },
                        MatchCandidate { tab: "2023".into(), row: 2 },
                    ]
                );
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn duplicates_within_one_tab_are_ambiguous() {
        let wb = MemoryWorkbook::new(vec![SheetTab::from_text(
            "2024",
            &[&["FILIACION"], &["ANA RUIZ"], &["ANA RUIZ"]],
        )]);
        let err = PatientRowResolver::default()
            .resolve(&wb, "ANA", "RUIZ")
            .unwrap_err();
        assert!(matches!(err, ResolveError::Ambiguous { ref locations, .. } if locations.len() == 2));
    }

    #[test]
    fn unknown_patient_not_found() {
        let err = PatientRowResolver::default()
            .resolve(&multi_tab_workbook(), "NADIE", "DESCONOCIDO")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::NoMatchingRow { tabs_searched: 4 },
                ..
            }
        ));
        assert!(err.to_string().contains("nadie desconocido"));
    }

    #[test]
    fn no_identity_column_differs_from_no_tabs() {
        let resolver = PatientRowResolver::default();

        let without_column = MemoryWorkbook::new(vec![
            SheetTab::from_text("Config", &[&["CLAVE", "VALOR"], &["JUAN GARCIA", "x"]]),
            SheetTab::from_text("Notas", &[&["TEXTO"]]),
        ]);
        let err = resolver.resolve(&without_column, "JUAN", "GARCIA").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::NoIdentityColumn { tabs: 2 },
                ..
            }
        ));

        let err = resolver
            .resolve(&MemoryWorkbook::default(), "JUAN", "GARCIA")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::NoTabs,
                ..
            }
        ));
    }

    #[test]
    fn empty_tabs_are_skipped() {
        let wb = MemoryWorkbook::new(vec![
            SheetTab::new("Blank", vec![]),
            SheetTab::from_text("2024", &[&["FILIACION"], &["JUAN GARCIA"]]),
        ]);
        let loc = PatientRowResolver::default()
            .resolve(&wb, "JUAN", "GARCIA")
            .unwrap();
        assert_eq!(loc.tab, "2024");
    }

    #[test]
    fn failing_tab_does_not_abort_search() {
        let wb = FlakyWorkbook {
            inner: multi_tab_workbook(),
            broken_tabs: &["2024"],
        };
        let resolver = PatientRowResolver::default();

        let loc = resolver.resolve(&wb, "ANA", "LOPEZ MARTINEZ").unwrap();
        assert_eq!(loc.tab, "2023");

        // The only row for JUAN lives in the broken tab.
        let err = resolver.resolve(&wb, "JUAN", "GARCIA LOPEZ").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn every_tab_failing_is_reported_as_unreadable() {
        let wb = FlakyWorkbook {
            inner: multi_tab_workbook(),
            broken_tabs: &["2024", "2023", "Pending", "Archive"],
        };
        let err = PatientRowResolver::default()
            .resolve(&wb, "JUAN", "GARCIA LOPEZ")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::TabsUnreadable { failed: 4, tabs: 4 },
                ..
            }
        ));
        assert!(err.to_string().contains("could not be read"));
    }

    #[test]
    fn unreadable_tabs_beside_columnless_ones_are_reported() {
        let wb = FlakyWorkbook {
            inner: MemoryWorkbook::new(vec![
                SheetTab::from_text("Notes", &[&["COMENTARIO"], &["revisar"]]),
                SheetTab::from_text("2024", &[&["FILIACION"], &["JUAN GARCIA"]]),
            ]),
            broken_tabs: &["2024"],
        };
        let err = PatientRowResolver::default()
            .resolve(&wb, "JUAN", "GARCIA")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::TabsUnreadable { failed: 1, tabs: 2 },
                ..
            }
        ));
    }

    #[test]
    fn listing_failure_is_workbook_error() {
        let err = PatientRowResolver::default()
            .resolve(&UnreachableWorkbook, "JUAN", "GARCIA")
            .unwrap_err();
        assert!(matches!(err, ResolveError::Workbook(_)));
        assert!(!err.is_lookup_outcome());
    }

    #[test]
    fn blank_name_never_matches_empty_cells() {
        let wb = MemoryWorkbook::new(vec![SheetTab::from_text(
            "2024",
            &[&["FILIACION", "X"], &["", "1"], &["", "2"]],
        )]);
        let err = PatientRowResolver::default().resolve(&wb, "  ", "").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                reason: NotFoundReason::BlankName,
                ..
            }
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let wb = multi_tab_workbook();
        let resolver = PatientRowResolver::default();
        assert_eq!(
            resolver.resolve(&wb, "PEDRO", "MARTINEZ GARCIA").unwrap(),
            resolver.resolve(&wb, "PEDRO", "MARTINEZ GARCIA").unwrap()
        );

        let dup = duplicate_workbook();
        let first = resolver.resolve(&dup, "DUPLICATE", "PATIENT").unwrap_err();
        let second = resolver.resolve(&dup, "DUPLICATE", "PATIENT").unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn custom_identity_fragment() {
        let wb = MemoryWorkbook::new(vec![SheetTab::from_text(
            "2024",
            &[&["Paciente"], &["JUAN GARCIA"]],
        )]);
        assert!(PatientRowResolver::default().resolve(&wb, "JUAN", "GARCIA").is_err());
        let loc = PatientRowResolver::new("paciente")
            .resolve(&wb, "JUAN", "GARCIA")
            .unwrap();
        assert_eq!(loc.row, 2);
    }

    #[test]
    fn identity_normalization() {
        let id = PatientIdentity::new("JUAN", "GARCIA LOPEZ");
        assert_eq!(id.forward, "juan garcia lopez");
        assert_eq!(id.reversed, "garcia lopez juan");
        assert!(id.matches(" GARCIA LOPEZ JUAN "));
        assert!(!id.matches("juan garcia"));
        assert!(!id.matches(""));
    }
}
