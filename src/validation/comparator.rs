//! Field-level accuracy scoring.
//!
//! Every (expected, actual) pair yields a score in [0, 100]. Rules apply in
//! order; the first one that matches the value types decides:
//! 1. both null → 100
//! 2. exactly one null → 0
//! 3. both text → trimmed, case-insensitive equality, no partial credit
//! 4. both numeric → proportional closeness
//! 5. both numeric on a coded field → exact match only
//! 6. mismatched types → loose equality
//!
//! Rule 5 needs to know the field, so it lives in [`score_field`].

use crate::models::{FieldKind, FieldValue};

pub const MAX_SCORE: f64 = 100.0;
pub const MIN_SCORE: f64 = 0.0;

/// Score one field: how close `actual` is to `expected`.
pub fn score(expected: &FieldValue, actual: &FieldValue) -> f64 {
    use FieldValue::*;

    match (expected, actual) {
        (Null, Null) => MAX_SCORE,
        (Null, _) | (_, Null) => MIN_SCORE,
        (Text(e), Text(a)) => exact(text_equal(e, a)),
        (e, a) if e.is_numeric() && a.is_numeric() => match (e.as_f64(), a.as_f64()) {
            (Some(e), Some(a)) => relative_accuracy(e, a),
            _ => MIN_SCORE,
        },
        (e, a) => exact(loose_equal(e, a)),
    }
}

/// Score one field, knowing what kind of value it carries.
///
/// Coded results (serology, hemoglobinopathy codes) never get partial
/// credit: 9 vs 8 is a different diagnosis, not an 89% match. Fields with
/// no known kind are scored like measurements.
pub fn score_field(kind: Option<FieldKind>, expected: &FieldValue, actual: &FieldValue) -> f64 {
    match kind {
        Some(FieldKind::Coded) if expected.is_numeric() && actual.is_numeric() => {
            exact(expected.as_f64() == actual.as_f64())
        }
        _ => score(expected, actual),
    }
}

/// Proportional closeness of two measurements.
///
/// `100 - |e - a| / |e| * 100`, clamped to [0, 100]. A zero expectation
/// only accepts an exact zero. No tolerance band.
pub fn relative_accuracy(expected: f64, actual: f64) -> f64 {
    if !expected.is_finite() || !actual.is_finite() {
        return exact(expected == actual);
    }
    if expected == 0.0 {
        return exact(actual == 0.0);
    }
    if expected == actual {
        return MAX_SCORE;
    }

    let relative_diff = (expected - actual).abs() / expected.abs() * 100.0;
    let accuracy = MAX_SCORE - relative_diff;
    if accuracy.is_nan() {
        return MIN_SCORE;
    }
    // Unequal values must never round up to a perfect score.
    accuracy.clamp(MIN_SCORE, MAX_SCORE).min(MAX_SCORE - f64::EPSILON * MAX_SCORE)
}

fn text_equal(expected: &str, actual: &str) -> bool {
    expected.trim().to_lowercase() == actual.trim().to_lowercase()
}

/// Equality across different value types. Text and numbers never compare
/// equal; the only cross-type pair that can match is integer vs real
/// carrying the same number, which rule 4 already handles.
fn loose_equal(expected: &FieldValue, actual: &FieldValue) -> bool {
    expected == actual
}

fn exact(equal: bool) -> f64 {
    if equal {
        MAX_SCORE
    } else {
        MIN_SCORE
    }
}
