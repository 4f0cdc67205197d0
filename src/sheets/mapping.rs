//! Field → spreadsheet column mapping.
//!
//! The order of slots is the order of columns in the patient sheets. Spacer
//! slots are columns the extractor never fills; they only matter when the
//! row is pasted by hand.

use serde::{Deserialize, Serialize};

use crate::models::{FieldKey, FieldValue};

/// Per-field value conversion applied before a value reaches the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "factor", rename_all = "snake_case")]
pub enum ValueTransform {
    /// Multiply numeric values; text passes through untouched.
    Scale(f64),
}

impl ValueTransform {
    pub fn apply(&self, value: &FieldValue) -> FieldValue {
        match (self, value) {
            (Self::Scale(factor), FieldValue::Integer(i)) => scale_integer(*i, *factor),
            (Self::Scale(factor), FieldValue::Real(r)) => FieldValue::Real(round_scaled(r * factor)),
            (Self::Scale(_), other) => other.clone(),
        }
    }
}

fn scale_integer(value: i64, factor: f64) -> FieldValue {
    if factor.fract() == 0.0 && factor.abs() < i64::MAX as f64 {
        if let Some(scaled) = value.checked_mul(factor as i64) {
            return FieldValue::Integer(scaled);
        }
    }
    FieldValue::Real(round_scaled(value as f64 * factor))
}

// 0.45 * 1000.0 is 450.00000000000006 in binary floating point.
fn round_scaled(x: f64) -> f64 {
    const PRECISION: f64 = 1e9;
    let rounded = (x * PRECISION).round() / PRECISION;
    if rounded.is_finite() {
        rounded
    } else {
        x
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum ColumnSlot {
    /// A column fed by an extracted field. `label` is a header fragment.
    Field {
        key: FieldKey,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<ValueTransform>,
    },
    /// A column that sits between mapped columns but is never filled.
    Spacer { label: String },
}

impl ColumnSlot {
    pub fn field(key: FieldKey, label: &str) -> Self {
        Self::Field {
            key,
            label: label.to_string(),
            transform: None,
        }
    }

    pub fn scaled(key: FieldKey, label: &str, factor: f64) -> Self {
        Self::Field {
            key,
            label: label.to_string(),
            transform: Some(ValueTransform::Scale(factor)),
        }
    }

    pub fn spacer(label: &str) -> Self {
        Self::Spacer {
            label: label.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Field { label, .. } | Self::Spacer { label } => label,
        }
    }
}

/// A mapped field ready for lookup: key, header fragment, optional transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedField<'a> {
    pub key: FieldKey,
    pub label: &'a str,
    pub transform: Option<ValueTransform>,
}

impl MappedField<'_> {
    /// The value to write for this field, or `None` if the field is absent or null.
    pub fn value_from(&self, fields: &crate::models::FieldMap) -> Option<FieldValue> {
        let raw = fields.get(self.key).filter(|v| !v.is_null())?;
        Some(match &self.transform {
            Some(t) => t.apply(raw),
            None => raw.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub slots: Vec<ColumnSlot>,
}

impl ColumnMapping {
    pub fn new(slots: Vec<ColumnSlot>) -> Self {
        Self { slots }
    }

    /// Field slots only, in column order.
    pub fn fields(&self) -> impl Iterator<Item = MappedField<'_>> {
        self.slots.iter().filter_map(|slot| match slot {
            ColumnSlot::Field {
                key,
                label,
                transform,
            } => Some(MappedField {
                key: *key,
                label,
                transform: *transform,
            }),
            ColumnSlot::Spacer { .. } => None,
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(ColumnSlot::label).collect()
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        use FieldKey::*;
        Self::new(vec![
            ColumnSlot::field(Hemoglobina, "Hb (g/dl) 12-18"),
            ColumnSlot::field(Hematocrito, "Hto (%) 36-50"),
            ColumnSlot::field(Vcm, "VCM (fl) (70-98)"),
            ColumnSlot::field(Ade, "ADE (>16,5)"),
            ColumnSlot::field(Plaquetas, "Plaquetas (x10^3/µL) 100-450"),
            ColumnSlot::field(Leucocitos, "Leucos (x10^3/µL) 5-12"),
            ColumnSlot::scaled(EosinofilosTotales, "Eo. Totales (mayor o = 450)", 1000.0),
            ColumnSlot::field(EosinofilosPorcentaje, "Eo (%) (mayor o = a 5)"),
            ColumnSlot::field(Glucosa, "Glu. (mg/dl) 60-110"),
            ColumnSlot::field(Creatinina, "Creatinina (mg/dl)"),
            ColumnSlot::field(Alt, "ALT (U/L) >45"),
            ColumnSlot::field(Ast, "AST (U/L) >37"),
            ColumnSlot::field(Ggt, "GGT (U/L) > 55"),
            ColumnSlot::field(Colesterol, "Col. T (100-200)"),
            ColumnSlot::field(Ferritina, "Ferritina (15-120)"),
            ColumnSlot::field(Vih, "VIH"),
            ColumnSlot::spacer("Hepatitis B codigo"),
            ColumnSlot::field(Vhc, "VHC"),
            ColumnSlot::field(Vha, "VHA"),
            ColumnSlot::field(Lues, "Lues"),
            ColumnSlot::field(Strongyloides, "STRONGYLOIDES"),
            ColumnSlot::field(Sarampion, "SARAMPIÓN"),
            ColumnSlot::spacer("Urianálisis"),
            ColumnSlot::spacer("Parasitos en orina"),
            ColumnSlot::field(Schistosoma, "SEROL SCHISTOSOMA"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;

    #[test]
    fn default_mapping_order_and_spacers() {
        let mapping = ColumnMapping::default();
        let labels = mapping.labels();
        assert_eq!(labels.len(), 25);
        assert_eq!(labels[0], "Hb (g/dl) 12-18");
        assert_eq!(labels[15..18], ["VIH", "Hepatitis B codigo", "VHC"]);
        assert_eq!(
            labels[21..25],
            ["SARAMPIÓN", "Urianálisis", "Parasitos en orina", "SEROL SCHISTOSOMA"]
        );
        assert_eq!(mapping.fields().count(), 22);
    }

    #[test]
    fn only_eosinophil_total_is_scaled() {
        let scaled: Vec<FieldKey> = ColumnMapping::default()
            .fields()
            .filter(|f| f.transform.is_some())
            .map(|f| f.key)
            .collect();
        assert_eq!(scaled, vec![FieldKey::EosinofilosTotales]);
    }

    #[test]
    fn scale_keeps_numeric_type() {
        let t = ValueTransform::Scale(1000.0);
        assert_eq!(t.apply(&FieldValue::Integer(2)), FieldValue::Integer(2000));
        assert_eq!(t.apply(&FieldValue::Real(0.45)), FieldValue::Real(450.0));
        assert_eq!(t.apply(&FieldValue::Real(0.123)), FieldValue::Real(123.0));
        assert_eq!(t.apply(&FieldValue::from("n/a")), FieldValue::from("n/a"));
    }

    #[test]
    fn integer_overflow_falls_back_to_real() {
        let t = ValueTransform::Scale(1000.0);
        assert!(matches!(t.apply(&FieldValue::Integer(i64::MAX)), FieldValue::Real(_)));
        let t = ValueTransform::Scale(0.5);
        assert_eq!(t.apply(&FieldValue::Integer(3)), FieldValue::Real(1.5));
    }

    #[test]
    fn mapped_value_skips_null_and_absent() {
        let fields = FieldMap::new()
            .with(FieldKey::EosinofilosTotales, 0.3)
            .with(FieldKey::Vih, FieldValue::Null);
        let mapping = ColumnMapping::default();
        let by_key = |k: FieldKey| mapping.fields().find(|f| f.key == k).unwrap();

        assert_eq!(
            by_key(FieldKey::EosinofilosTotales).value_from(&fields),
            Some(FieldValue::Real(300.0))
        );
        assert_eq!(by_key(FieldKey::Vih).value_from(&fields), None);
        assert_eq!(by_key(FieldKey::Glucosa).value_from(&fields), None);
    }

    #[test]
    fn mapping_round_trips_through_json() {
        let mapping = ColumnMapping::default();
        let json = serde_json::to_string(&mapping).unwrap();
        assert!(json.contains(r#""slot":"spacer""#));
        assert!(json.contains(r#""kind":"scale","factor":1000.0"#));
        let back: ColumnMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
