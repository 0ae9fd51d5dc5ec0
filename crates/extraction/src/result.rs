//! Consumer-facing extraction result and its contract check.
//!
//! `extraction_notes` is the only channel for data-quality flags.
//! `data_quality_issues` survives from the previous contract so older
//! consumers keep parsing; it must always be empty.

use crate::notes::{json_type, validate_batch, BatchValidation, ExtractionNote, SchemaViolation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const NOTES_KEY: &str = "extraction_notes";
const LEGACY_ISSUES_KEY: &str = "data_quality_issues";
const RESERVED_KEYS: [&str; 2] = [NOTES_KEY, LEGACY_ISSUES_KEY];

/// Structured output handed to downstream agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Domain-specific extracted fields, carried verbatim
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// Notes in extraction order
    #[serde(default)]
    pub extraction_notes: Vec<ExtractionNote>,

    /// Backward-compatible field; always serialized, always empty
    #[serde(default)]
    pub data_quality_issues: Vec<Value>,
}

/// A result that breaks the output contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("Extraction result must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("'{key}' must be an array, got {found}")]
    NotAnArray {
        key: &'static str,
        found: &'static str,
    },

    #[error("'data_quality_issues' must be empty, found {count} entries")]
    DataQualityIssuesPopulated { count: usize },

    #[error("'{key}' is reserved and must not appear among extracted fields")]
    ReservedFieldKey { key: &'static str },
}

impl ExtractionResult {
    /// Wrap extracted domain fields.
    ///
    /// `extraction_notes` and `data_quality_issues` are owned by the result
    /// itself; those keys are dropped from `fields` so serialization emits
    /// each of them once.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        for key in RESERVED_KEYS {
            if fields.remove(key).is_some() {
                tracing::debug!("Dropped reserved key '{}' from extracted fields", key);
            }
        }
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Append a note, keeping extraction order.
    pub fn push_note(&mut self, note: ExtractionNote) {
        self.extraction_notes.push(note);
    }

    /// Check the invariants of the current contract.
    pub fn check_contract(&self) -> Result<(), ContractViolation> {
        if let Some(key) = RESERVED_KEYS.into_iter().find(|k| self.fields.contains_key(*k)) {
            return Err(ContractViolation::ReservedFieldKey { key });
        }
        if !self.data_quality_issues.is_empty() {
            return Err(ContractViolation::DataQualityIssuesPopulated {
                count: self.data_quality_issues.len(),
            });
        }
        Ok(())
    }

    pub fn is_conformant(&self) -> bool {
        self.check_contract().is_ok()
    }
}

/// What intake of a raw producer payload found.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeReport {
    /// The result with every valid note; rejected notes are left out
    pub result: ExtractionResult,
    /// Rejected notes by their index in the raw `extraction_notes` array
    pub note_errors: Vec<(usize, SchemaViolation)>,
    /// Contract problems that did not prevent intake
    pub contract_violations: Vec<ContractViolation>,
}

impl IntakeReport {
    pub fn is_clean(&self) -> bool {
        self.note_errors.is_empty() && self.contract_violations.is_empty()
    }
}

/// Take in a raw producer payload.
///
/// Only a structurally unusable payload (not an object, or a notes/issues
/// key that is not an array) fails outright. Malformed notes and a
/// populated `data_quality_issues` are reported without aborting.
pub fn intake(raw: Value) -> Result<IntakeReport, ContractViolation> {
    let mut fields = match raw {
        Value::Object(map) => map,
        other => {
            return Err(ContractViolation::NotAnObject {
                found: json_type(&other),
            })
        }
    };

    let raw_notes = take_array(&mut fields, NOTES_KEY)?;
    let legacy_issues = take_array(&mut fields, LEGACY_ISSUES_KEY)?;

    let BatchValidation { valid, errors } = validate_batch(&raw_notes);

    let result = ExtractionResult {
        fields,
        extraction_notes: valid,
        data_quality_issues: legacy_issues,
    };

    let contract_violations: Vec<ContractViolation> =
        result.check_contract().err().into_iter().collect();

    tracing::debug!(
        "Intake: {} notes accepted, {} rejected, {} contract violations",
        result.extraction_notes.len(),
        errors.len(),
        contract_violations.len()
    );

    Ok(IntakeReport {
        result,
        note_errors: errors,
        contract_violations,
    })
}

fn take_array(
    fields: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Vec<Value>, ContractViolation> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ContractViolation::NotAnArray {
            key,
            found: json_type(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::ExtractionStatus;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "facility_name": "Riverside Plant",
            "pollutant_list": [{ "name": "Benzene", "cas_number": null }],
            "extraction_notes": [
                {
                    "field": "pollutant_list[0].cas_number",
                    "status": "missing_in_source",
                    "note": "CAS column is blank for Benzene"
                }
            ],
            "data_quality_issues": []
        })
    }

    #[test]
    fn test_clean_intake() {
        let report = intake(sample_payload()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.result.extraction_notes.len(), 1);
        assert_eq!(
            report.result.extraction_notes[0].status(),
            ExtractionStatus::MissingInSource
        );
        assert_eq!(report.result.fields["facility_name"], json!("Riverside Plant"));
        assert!(!report.result.fields.contains_key("extraction_notes"));
    }

    #[test]
    fn test_populated_legacy_issues_flagged() {
        let mut payload = sample_payload();
        payload["data_quality_issues"] = json!([{ "issue": "missing CAS", "severity": "high" }]);

        let report = intake(payload).unwrap();
        assert_eq!(
            report.contract_violations,
            vec![ContractViolation::DataQualityIssuesPopulated { count: 1 }]
        );
        assert!(!report.result.is_conformant());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_bad_note_does_not_abort_intake() {
        let mut payload = sample_payload();
        payload["extraction_notes"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "field": "facility_name", "status": "CRITICAL" }));

        let report = intake(payload).unwrap();
        assert_eq!(report.result.extraction_notes.len(), 1);
        assert_eq!(report.note_errors.len(), 1);
        assert_eq!(report.note_errors[0].0, 1);
        assert!(report.contract_violations.is_empty());
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let report = intake(json!({ "facility_name": "X" })).unwrap();
        assert!(report.is_clean());
        assert!(report.result.extraction_notes.is_empty());
        assert!(report.result.data_quality_issues.is_empty());
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(
            intake(json!("text")),
            Err(ContractViolation::NotAnObject { found: "string" })
        );
        assert_eq!(
            intake(json!({ "extraction_notes": {} })),
            Err(ContractViolation::NotAnArray {
                key: "extraction_notes",
                found: "object"
            })
        );
    }

    #[test]
    fn test_serialized_result_keeps_empty_legacy_field() {
        let mut result = ExtractionResult::new(Map::new());
        result.push_note(
            ExtractionNote::new("site.permit_id", ExtractionStatus::UnclearFormat, "smudged")
                .unwrap(),
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["data_quality_issues"], json!([]));
        assert_eq!(value["extraction_notes"][0]["status"], json!("unclear_format"));
    }

    #[test]
    fn test_new_drops_reserved_keys_from_fields() {
        let mut fields = Map::new();
        fields.insert("facility_name".to_string(), json!("Riverside Plant"));
        fields.insert("extraction_notes".to_string(), json!([{ "field": "x" }]));
        fields.insert("data_quality_issues".to_string(), json!(["missing CAS"]));

        let result = ExtractionResult::new(fields);
        assert_eq!(result.fields.len(), 1);
        assert!(result.is_conformant());

        let text = serde_json::to_string(&result).unwrap();
        assert_eq!(text.matches("\"extraction_notes\"").count(), 1);
        assert_eq!(text.matches("\"data_quality_issues\"").count(), 1);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["data_quality_issues"], json!([]));
        assert_eq!(value["extraction_notes"], json!([]));
        assert_eq!(value["facility_name"], json!("Riverside Plant"));
    }

    #[test]
    fn test_reserved_key_inserted_after_construction_is_flagged() {
        let mut result = ExtractionResult::new(Map::new());
        result
            .fields
            .insert("data_quality_issues".to_string(), json!(["late"]));
        assert_eq!(
            result.check_contract(),
            Err(ContractViolation::ReservedFieldKey {
                key: "data_quality_issues"
            })
        );
    }

    #[test]
    fn test_deserialize_and_check_contract() {
        let result: ExtractionResult = serde_json::from_value(sample_payload()).unwrap();
        assert!(result.is_conformant());

        let mut legacy = result.clone();
        legacy.data_quality_issues.push(json!("anything"));
        assert_eq!(
            legacy.check_contract(),
            Err(ContractViolation::DataQualityIssuesPopulated { count: 1 })
        );
    }
}
