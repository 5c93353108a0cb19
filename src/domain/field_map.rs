use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::source_row::SourceRow;

/// Mapping from PDF form field name to the string value to fill in.
pub type FieldMap = BTreeMap<String, String>;

/// How a source cell is turned into the field's string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// String cells pass through verbatim.
    Text,
    /// The sheet hands these back as JSON numbers; stringify explicitly.
    Numeric,
}

impl Coercion {
    fn apply(self, value: &Value) -> String {
        match (self, value) {
            (_, Value::String(s)) => s.clone(),
            (_, Value::Null) => String::new(),
            (Coercion::Numeric, Value::Number(n)) => n.to_string(),
            (_, Value::Bool(b)) => b.to_string(),
            // Text fields with non-string cells fall through to the JSON
            // rendering, so a numeric Zip still lands as digits.
            (_, other) => other.to_string(),
        }
    }
}

/// Rename table: (PDF form field, spreadsheet column, coercion).
///
/// Field names must match the template's AcroForm exactly, including the
/// truncated "Parcel I". Keep this a literal table; nothing here may be
/// inferred from fuzzy name matching at runtime.
pub const FIELD_TABLE: &[(&str, &str, Coercion)] = &[
    ("Physical Address", "Physical Address", Coercion::Text),
    ("Address", "Owner Address", Coercion::Text),
    ("Zip", "Zip", Coercion::Text),
    ("Owner Name", "Owner Name", Coercion::Text),
    ("Owner Zip", "Owner Zip", Coercion::Text),
    ("Owner Phone", "Owner Phone", Coercion::Text),
    ("Owner Email", "Owner Email", Coercion::Text),
    ("Cost of Demolition", "Cost of Demolition", Coercion::Numeric),
    ("Floors", "Floors", Coercion::Numeric),
    ("Units", "Units", Coercion::Numeric),
    ("Total SQ FT", "Total SQ FT", Coercion::Numeric),
    ("Sewer", "Sewer", Coercion::Text),
    ("Septic", "Septic", Coercion::Text),
    ("Electrical", "Electrical", Coercion::Text),
    ("Plumbing", "Plumbing", Coercion::Text),
    ("Gas", "Gas", Coercion::Text),
    ("Escambia County", "Escambia County", Coercion::Text),
    ("City of Pensacola", "City of Pensacola", Coercion::Text),
    ("City", "City", Coercion::Text),
    ("Parcel I", "Parcel ID", Coercion::Text),
    ("Owner City", "Owner City", Coercion::Text),
    ("State", "State", Coercion::Text),
    ("Owner State", "Owner State", Coercion::Text),
    ("Scope", "Scope", Coercion::Text),
];

/// Translates one source row into the fixed field mapping.
///
/// Deterministic and side-effect-free: every target field of [`FIELD_TABLE`]
/// is present in the output, missing source columns default to `""`.
pub fn map_fields(row: &SourceRow) -> FieldMap {
    FIELD_TABLE
        .iter()
        .map(|(target, source, coercion)| {
            let value = row
                .get(source)
                .map(|cell| coercion.apply(cell))
                .unwrap_or_default();
            ((*target).to_string(), value)
        })
        .collect()
}
