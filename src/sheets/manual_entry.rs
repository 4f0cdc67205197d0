//! Manual-entry row: what an operator pastes when a patient row could not
//! be written automatically (not found, ambiguous, or write failure).
//!
//! Display values use Spanish number formatting. The underlying values stay
//! locale-neutral everywhere else in the engine.

use serde::Serialize;

use super::mapping::{ColumnMapping, ColumnSlot, ValueTransform};
use crate::models::{FieldMap, FieldValue};

const MAX_FRACTION_DIGITS: usize = 3;
/// Grouping separators appear only from this many integer digits on (es_ES).
const MIN_GROUPED_DIGITS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualEntryRow {
    pub headers: Vec<String>,
    pub values: Vec<String>,
    /// Tab-separated values with a trailing newline, ready to paste.
    pub tsv: String,
}

impl ManualEntryRow {
    pub fn build(fields: &FieldMap, mapping: &ColumnMapping) -> Self {
        let mut headers = Vec::with_capacity(mapping.slots.len());
        let mut values = Vec::with_capacity(mapping.slots.len());

        for slot in &mapping.slots {
            headers.push(slot.label().to_string());
            let display = match slot {
                ColumnSlot::Field { key, transform, .. } => match fields.get(*key) {
                    None | Some(FieldValue::Null) => String::new(),
                    Some(value) => display_value(value, transform.as_ref()),
                },
                ColumnSlot::Spacer { .. } => String::new(),
            };
            values.push(display);
        }

        // Empty fields must survive in the TSV or the paste shifts columns.
        let tsv = format!("{}\n", values.join("\t"));
        Self {
            headers,
            values,
            tsv,
        }
    }

    pub fn header_line(&self) -> String {
        self.headers.join("\t")
    }
}

fn display_value(value: &FieldValue, transform: Option<&ValueTransform>) -> String {
    let value = match transform {
        Some(t) => t.apply(value),
        None => value.clone(),
    };
    match value {
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Real(r) => format_spanish_decimal(r),
        FieldValue::Text(s) => s,
        FieldValue::Null => String::new(),
    }
}

/// `12.6` → `"12,6"`, `450.0` → `"450"`, `12345.5` → `"12.345,5"`.
pub fn format_spanish_decimal(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, x.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if x.is_sign_negative() && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    if int_part.len() >= MIN_GROUPED_DIGITS {
        out.push_str(&group_thousands(int_part));
    } else {
        out.push_str(int_part);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}
