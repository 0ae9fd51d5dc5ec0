//! Extraction notes: the closed status taxonomy and its validator.
//!
//! Notes flag technical completeness or clarity problems in extracted data.
//! They deliberately carry no severity, impact or priority; a candidate with
//! any of those attributes is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Attributes that must never appear on a note.
const FORBIDDEN_ATTRIBUTES: [&str; 3] = ["severity", "impact", "priority"];

/// Why a field could not be extracted cleanly.
///
/// Adding a variant is a contract change for every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// The documents do not cover this field at all
    NotProvidedInDocuments,
    /// The source has a slot for the value but it is blank
    MissingInSource,
    /// A value exists but its format cannot be read reliably
    UnclearFormat,
    /// The table that should hold the value has no rows
    TableEmpty,
    /// A value was extracted but may be wrong
    ExtractionUncertain,
}

impl ExtractionStatus {
    pub const ALL: [ExtractionStatus; 5] = [
        ExtractionStatus::NotProvidedInDocuments,
        ExtractionStatus::MissingInSource,
        ExtractionStatus::UnclearFormat,
        ExtractionStatus::TableEmpty,
        ExtractionStatus::ExtractionUncertain,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::NotProvidedInDocuments => "not_provided_in_documents",
            ExtractionStatus::MissingInSource => "missing_in_source",
            ExtractionStatus::UnclearFormat => "unclear_format",
            ExtractionStatus::TableEmpty => "table_empty",
            ExtractionStatus::ExtractionUncertain => "extraction_uncertain",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = SchemaViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| SchemaViolation::UnknownStatus {
                value: s.to_string(),
            })
    }
}

/// A validated extraction note.
///
/// Deserializing goes through [`validate`], so a note obtained from JSON
/// always satisfies the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ExtractionNote {
    field: String,
    status: ExtractionStatus,
    note: String,
}

impl ExtractionNote {
    /// Build a note directly; `field` must be non-empty.
    pub fn new(
        field: impl Into<String>,
        status: ExtractionStatus,
        note: impl Into<String>,
    ) -> Result<Self, SchemaViolation> {
        let field = field.into();
        if field.is_empty() {
            return Err(SchemaViolation::EmptyField { field: "field" });
        }
        Ok(Self {
            field,
            status,
            note: note.into(),
        })
    }

    /// Path of the target data field, e.g. `pollutant_list[0].cas_number`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn status(&self) -> ExtractionStatus {
        self.status
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

impl TryFrom<Value> for ExtractionNote {
    type Error = SchemaViolation;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        validate(&value)
    }
}

/// A candidate note that does not satisfy the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("Extraction note must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("Extraction note is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Extraction note field '{field}' must be a string, got {found}")]
    InvalidType {
        field: &'static str,
        found: &'static str,
    },

    #[error("Extraction note field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("Unknown extraction note status '{value}'")]
    UnknownStatus { value: String },

    #[error("Extraction notes must not carry '{attribute}'")]
    ForbiddenAttribute { attribute: String },
}

/// Validate one loosely-typed candidate.
///
/// Stops at the first problem found.
pub fn validate(candidate: &Value) -> Result<ExtractionNote, SchemaViolation> {
    let object = candidate.as_object().ok_or(SchemaViolation::NotAnObject {
        found: json_type(candidate),
    })?;

    if let Some(attribute) = FORBIDDEN_ATTRIBUTES
        .iter()
        .find(|attr| object.contains_key(**attr))
    {
        return Err(SchemaViolation::ForbiddenAttribute {
            attribute: attribute.to_string(),
        });
    }

    let field = required_str(object, "field")?;
    if field.is_empty() {
        return Err(SchemaViolation::EmptyField { field: "field" });
    }

    let status: ExtractionStatus = required_str(object, "status")?.parse()?;

    let note = match object.get("note") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(SchemaViolation::InvalidType {
                field: "note",
                found: json_type(other),
            })
        }
    };

    Ok(ExtractionNote {
        field: field.to_string(),
        status,
        note,
    })
}

/// Outcome of validating a sequence of candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchValidation {
    /// Valid notes in input order
    pub valid: Vec<ExtractionNote>,
    /// Input index and violation of every rejected candidate
    pub errors: Vec<(usize, SchemaViolation)>,
}

impl BatchValidation {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate each candidate independently.
///
/// A malformed entry is recorded and skipped; it never stops the others.
pub fn validate_batch<'a, I>(candidates: I) -> BatchValidation
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut batch = BatchValidation::default();

    for (index, candidate) in candidates.into_iter().enumerate() {
        match validate(candidate) {
            Ok(note) => batch.valid.push(note),
            Err(violation) => {
                tracing::debug!("Extraction note {} rejected: {}", index, violation);
                batch.errors.push((index, violation));
            }
        }
    }

    if !batch.errors.is_empty() {
        tracing::warn!(
            "{} of {} extraction notes failed validation",
            batch.errors.len(),
            batch.errors.len() + batch.valid.len()
        );
    }

    batch
}

fn required_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SchemaViolation> {
    match object.get(field) {
        None | Some(Value::Null) => Err(SchemaViolation::MissingField { field }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SchemaViolation::InvalidType {
            field,
            found: json_type(other),
        }),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note_json(field: &str, status: &str) -> Value {
        json!({ "field": field, "status": status, "note": "CAS number column is blank" })
    }

    #[test]
    fn test_accepts_known_status() {
        let note = validate(&note_json("pollutant_list[0].cas_number", "missing_in_source")).unwrap();
        assert_eq!(note.field(), "pollutant_list[0].cas_number");
        assert_eq!(note.status(), ExtractionStatus::MissingInSource);
        assert_eq!(note.note(), "CAS number column is blank");
    }

    #[test]
    fn test_rejects_unknown_status() {
        let result = validate(&note_json("pollutant_list[0].cas_number", "CRITICAL"));
        assert_eq!(
            result,
            Err(SchemaViolation::UnknownStatus {
                value: "CRITICAL".to_string()
            })
        );
    }

    #[test]
    fn test_every_status_round_trips_through_wire_name() {
        for status in ExtractionStatus::ALL {
            let note = validate(&note_json("site.name", status.as_str())).unwrap();
            assert_eq!(note.status(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                Value::String(status.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_status_is_case_sensitive() {
        assert!(validate(&note_json("site.name", "Missing_In_Source")).is_err());
        assert!(validate(&note_json("site.name", " missing_in_source")).is_err());
    }

    #[test]
    fn test_field_must_be_present_and_non_empty() {
        assert_eq!(
            validate(&json!({ "status": "table_empty" })),
            Err(SchemaViolation::MissingField { field: "field" })
        );
        assert_eq!(
            validate(&note_json("", "table_empty")),
            Err(SchemaViolation::EmptyField { field: "field" })
        );
        // Any non-empty path is accepted, whitespace included
        let padded = validate(&note_json("   ", "table_empty")).unwrap();
        assert_eq!(padded.field(), "   ");
        assert_eq!(
            validate(&json!({ "field": 3, "status": "table_empty" })),
            Err(SchemaViolation::InvalidType {
                field: "field",
                found: "number"
            })
        );
    }

    #[test]
    fn test_status_must_be_present() {
        assert_eq!(
            validate(&json!({ "field": "site.name", "note": "x" })),
            Err(SchemaViolation::MissingField { field: "status" })
        );
    }

    #[test]
    fn test_note_text_optional_but_typed() {
        let note = validate(&json!({ "field": "site.name", "status": "unclear_format" })).unwrap();
        assert_eq!(note.note(), "");

        assert!(matches!(
            validate(&json!({ "field": "site.name", "status": "unclear_format", "note": 1 })),
            Err(SchemaViolation::InvalidType { field: "note", .. })
        ));
    }

    #[test]
    fn test_severity_attributes_rejected() {
        for attr in ["severity", "impact", "priority"] {
            let mut candidate = note_json("site.name", "table_empty");
            candidate[attr] = json!("high");
            assert_eq!(
                validate(&candidate),
                Err(SchemaViolation::ForbiddenAttribute {
                    attribute: attr.to_string()
                })
            );
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            validate(&json!(["field", "status"])),
            Err(SchemaViolation::NotAnObject { found: "array" })
        );
    }

    #[test]
    fn test_batch_one_malformed_entry() {
        for n in 1..=6 {
            let mut candidates: Vec<Value> = (0..n)
                .map(|i| note_json(&format!("rows[{}].value", i), "extraction_uncertain"))
                .collect();
            let bad = n / 2;
            candidates[bad] = note_json("rows.value", "CRITICAL");

            let batch = validate_batch(&candidates);
            assert_eq!(batch.valid.len(), n - 1);
            assert_eq!(batch.errors.len(), 1);
            assert_eq!(batch.errors[0].0, bad);
            assert!(!batch.is_clean());
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let candidates = vec![
            note_json("b", "table_empty"),
            json!(null),
            note_json("a", "table_empty"),
        ];
        let batch = validate_batch(&candidates);
        let fields: Vec<&str> = batch.valid.iter().map(|n| n.field()).collect();
        assert_eq!(fields, vec!["b", "a"]);
        assert_eq!(batch.errors[0].0, 1);
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let ok: ExtractionNote = serde_json::from_value(note_json("x.y", "table_empty")).unwrap();
        assert_eq!(ok.status(), ExtractionStatus::TableEmpty);

        let bad = serde_json::from_value::<ExtractionNote>(note_json("x.y", "CRITICAL"));
        assert!(bad.is_err());
    }

    #[test]
    fn test_new_rejects_empty_field() {
        assert!(ExtractionNote::new("", ExtractionStatus::TableEmpty, "").is_err());
        assert!(ExtractionNote::new(" ", ExtractionStatus::TableEmpty, "").is_ok());
        let note = ExtractionNote::new("a.b", ExtractionStatus::TableEmpty, "empty").unwrap();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json, json!({ "field": "a.b", "status": "table_empty", "note": "empty" }));
    }
}
