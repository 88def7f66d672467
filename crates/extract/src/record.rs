use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A problem noticed while validating one field of a model reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldIssue {
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub problem: String,
}

impl FieldIssue {
    pub fn new(section: &str, field: Option<String>, problem: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            field,
            problem: problem.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// No JSON object could be recovered from the reply.
    Unparseable,
    /// A JSON object came back but none of its keys are declared fields.
    NoSchemaFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// Usable, but some fields were missing or failed coercion.
    Partial,
    Invalid(InvalidReason),
}

/// One section's reply coerced into its declared fields.
///
/// `values` always holds every declared field: a typed value, `null`, or
/// `[]` for repeated groups.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSection {
    pub section: &'static str,
    pub values: Map<String, Value>,
    pub issues: Vec<FieldIssue>,
    pub validity: Validity,
}

impl ValidatedSection {
    pub fn is_invalid(&self) -> bool {
        matches!(self.validity, Validity::Invalid(_))
    }
}

/// The structured record persisted for one report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredRecord {
    pub report_id: String,
    pub cancer_excision_report: bool,
    pub cancer_category: Option<String>,
    pub cancer_category_others_description: Option<String>,
    pub cancer_data: Map<String, Value>,
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<FieldIssue>,
}

impl StructuredRecord {
    /// Record for a report that is not a registrable cancer excision.
    pub fn not_eligible(report_id: &str) -> Self {
        Self {
            report_id: report_id.to_string(),
            cancer_excision_report: false,
            cancer_category: None,
            cancer_category_others_description: None,
            cancer_data: Map::new(),
            valid: true,
            issues: Vec::new(),
        }
    }
}
