// Column schema discovery from a tab's header row.
// Header text is matched by case-insensitive substring, first match wins.
// Column letters are bijective base-26 (A..Z, AA..AZ, ...), no zero digit.

use serde::Serialize;

use crate::models::FieldValue;

/// Read range used when a tab has no usable header row.
pub const DEFAULT_RANGE: ColumnRange = ColumnRange { first: 0, last: 25 };

/// Index of the first non-empty header cell containing `fragment`,
/// ignoring case. Empty header cells never match.
pub fn find_column(header: &[FieldValue], fragment: &str) -> Option<usize> {
    let needle = fragment.to_lowercase();
    header.iter().position(|cell| {
        !cell.is_blank() && cell.to_cell_text().to_lowercase().contains(&needle)
    })
}

/// Highest index holding a non-empty header, or `None` if there is none.
pub fn bounding_column(header: &[FieldValue]) -> Option<usize> {
    header.iter().rposition(|cell| !cell.is_blank())
}

/// Minimal column range covering every labelled column.
pub fn read_range(header: &[FieldValue]) -> ColumnRange {
    match bounding_column(header) {
        Some(last) => ColumnRange { first: 0, last },
        None => DEFAULT_RANGE,
    }
}

/// 0 → "A", 25 → "Z", 26 → "AA", 27 → "AB".
pub fn index_to_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index as i64;
    while n >= 0 {
        letters.push((b'A' + (n % 26) as u8) as char);
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Inverse of [`index_to_letter`]. Accepts lower case; rejects anything
/// that is not a run of ASCII letters.
pub fn letter_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Inclusive range of columns, rendered as `A:AC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl ColumnRange {
    pub fn contains(&self, column: usize) -> bool {
        (self.first..=self.last).contains(&column)
    }
}

impl std::fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", index_to_letter(self.first), index_to_letter(self.last))
    }
}

/// A single cell in A1 notation. `row` is 1-based, as spreadsheets count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub column: usize,
    pub row: usize,
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", index_to_letter(self.column), self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<FieldValue> {
        cells.iter().map(|c| FieldValue::Text(c.to_string())).collect()
    }

    #[test]
    fn letter_anchors() {
        assert_eq!(index_to_letter(0), "A");
        assert_eq!(index_to_letter(25), "Z");
        assert_eq!(index_to_letter(26), "AA");
        assert_eq!(index_to_letter(27), "AB");
        assert_eq!(index_to_letter(51), "AZ");
        assert_eq!(index_to_letter(52), "BA");
        assert_eq!(index_to_letter(701), "ZZ");
        assert_eq!(index_to_letter(702), "AAA");
    }

    #[test]
    fn letter_round_trip() {
        for i in 0..=1000 {
            assert_eq!(letter_to_index(&index_to_letter(i)), Some(i), "index {i}");
        }
    }

    #[test]
    fn letter_to_index_rejects_garbage() {
        assert_eq!(letter_to_index(""), None);
        assert_eq!(letter_to_index("A1"), None);
        assert_eq!(letter_to_index("Ñ"), None);
        assert_eq!(letter_to_index("ab"), Some(27));
    }

    #[test]
    fn find_column_substring_case_insensitive() {
        let h = header(&["NOMBRE", "APELLIDOS", "Filiacion paciente", "Hb (g/dl) 12-18"]);
        assert_eq!(find_column(&h, "FILIACION"), Some(2));
        assert_eq!(find_column(&h, "hb (g/dl)"), Some(3));
        assert_eq!(find_column(&h, "VIH"), None);
    }

    #[test]
    fn find_column_first_match_wins() {
        let h = header(&["VIH", "VIH confirmación"]);
        assert_eq!(find_column(&h, "vih"), Some(0));
    }

    #[test]
    fn find_column_skips_empty_cells() {
        let h = header(&["", "  ", "X"]);
        assert_eq!(find_column(&h, ""), Some(2));
    }

    #[test]
    fn numeric_header_cells_match_as_text() {
        let h = vec![FieldValue::Integer(2024), FieldValue::Text("FILIACION".into())];
        assert_eq!(find_column(&h, "2024"), Some(0));
    }

    #[test]
    fn bounding_column_ignores_trailing_blanks() {
        let h = header(&["A", "", "C", "", "  "]);
        assert_eq!(bounding_column(&h), Some(2));
        assert_eq!(read_range(&h).to_string(), "A:C");
    }

    #[test]
    fn empty_header_uses_default_range() {
        assert_eq!(bounding_column(&[]), None);
        assert_eq!(read_range(&[]).to_string(), "A:Z");
        assert_eq!(read_range(&header(&["", ""])), DEFAULT_RANGE);
    }

    #[test]
    fn wide_header_range() {
        let cells: Vec<String> = (0..29).map(|i| format!("col{i}")).collect();
        let h: Vec<FieldValue> = cells.into_iter().map(FieldValue::Text).collect();
        assert_eq!(read_range(&h).to_string(), "A:AC");
    }

    #[test]
    fn cell_ref_a1_notation() {
        assert_eq!(CellRef { column: 0, row: 2 }.to_string(), "A2");
        assert_eq!(CellRef { column: 28, row: 15 }.to_string(), "AC15");
    }
}
