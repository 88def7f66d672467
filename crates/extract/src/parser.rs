use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::record::{FieldIssue, InvalidReason, ValidatedSection, Validity};
use crate::schema::{FieldKind, FieldSpec, SectionSpec};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("valid regex"));

/// Phrases models use for "the report does not say".
const UNKNOWN_MARKERS: &[&str] = &[
    "",
    "-",
    "unknown",
    "n/a",
    "na",
    "null",
    "not specified",
    "not stated",
    "not reported",
    "not mentioned",
    "not available",
    "not applicable",
];

/// Recover a JSON object from a model reply: the whole reply, a fenced
/// ```json block, or the outermost `{...}` span.
pub fn extract_json_object(reply: &str) -> Option<Map<String, Value>> {
    let trimmed = reply.trim();

    if let Some(object) = parse_object(trimmed) {
        return Some(object);
    }

    for captures in FENCED_JSON.captures_iter(trimmed) {
        if let Some(object) = captures.get(1).and_then(|m| parse_object(m.as_str().trim())) {
            return Some(object);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&trimmed[start..=end])
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Coerce a raw reply into the section's declared fields.
///
/// Never fails: unusable replies come back flagged `Invalid` with every field
/// set to its empty value.
pub fn validate_section(section: &SectionSpec, reply: &str) -> ValidatedSection {
    let Some(object) = extract_json_object(reply) else {
        return invalid(section, InvalidReason::Unparseable, "no JSON object in reply");
    };

    let by_key: HashMap<String, &Value> = object
        .iter()
        .map(|(k, v)| (normalize_key(k), v))
        .collect();

    let extraneous: Vec<&str> = object
        .keys()
        .filter(|k| section.field(&normalize_key(k)).is_none())
        .map(String::as_str)
        .collect();
    if !extraneous.is_empty() {
        debug!(section = section.name, keys = ?extraneous, "Dropping undeclared keys");
    }

    let matched = section
        .fields
        .iter()
        .filter(|f| by_key.contains_key(f.name))
        .count();
    if matched == 0 && !object.is_empty() {
        return invalid(
            section,
            InvalidReason::NoSchemaFields,
            "reply object has none of the declared fields",
        );
    }

    let mut values = Map::new();
    let mut issues = Vec::new();

    for field in section.fields {
        let value = match by_key.get(field.name) {
            None => {
                issues.push(FieldIssue::new(section.name, Some(field.name.to_string()), "missing from reply"));
                empty_value(field)
            }
            Some(raw) => coerce_field(section.name, field.name, field, raw, &mut issues),
        };
        values.insert(field.name.to_string(), value);
    }

    let validity = if issues.is_empty() {
        Validity::Valid
    } else {
        Validity::Partial
    };

    ValidatedSection {
        section: section.name,
        values,
        issues,
        validity,
    }
}

fn invalid(section: &SectionSpec, reason: InvalidReason, problem: &str) -> ValidatedSection {
    ValidatedSection {
        section: section.name,
        values: section
            .fields
            .iter()
            .map(|f| (f.name.to_string(), empty_value(f)))
            .collect(),
        issues: vec![FieldIssue::new(section.name, None, problem)],
        validity: Validity::Invalid(reason),
    }
}

/// `[]` for repeated groups, `null` otherwise.
pub fn empty_value(field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::Group(_) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

fn coerce_field(
    section: &str,
    path: &str,
    field: &FieldSpec,
    raw: &Value,
    issues: &mut Vec<FieldIssue>,
) -> Value {
    if let FieldKind::Group(sub_fields) = field.kind {
        return coerce_group(section, path, sub_fields, raw, issues);
    }

    match coerce_scalar(&field.kind, raw) {
        Ok(value) => value,
        Err(problem) => {
            issues.push(FieldIssue::new(section, Some(path.to_string()), problem));
            Value::Null
        }
    }
}

fn coerce_group(
    section: &str,
    path: &str,
    sub_fields: &[FieldSpec],
    raw: &Value,
    issues: &mut Vec<FieldIssue>,
) -> Value {
    let items: Vec<&Value> = match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![raw],
        Value::String(s) if is_absent(s) => Vec::new(),
        other => {
            issues.push(FieldIssue::new(
                section,
                Some(path.to_string()),
                format!("expected a list of entries, got {}", type_name(other)),
            ));
            Vec::new()
        }
    };

    let mut entries = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        let Value::Object(object) = item else {
            issues.push(FieldIssue::new(
                section,
                Some(item_path),
                format!("entry dropped: expected an object, got {}", type_name(item)),
            ));
            continue;
        };

        let by_key: HashMap<String, &Value> = object
            .iter()
            .map(|(k, v)| (normalize_key(k), v))
            .collect();

        let mut entry = Map::new();
        for sub in sub_fields {
            let value = match by_key.get(sub.name) {
                None => Value::Null,
                Some(raw) => {
                    let sub_path = format!("{item_path}.{}", sub.name);
                    coerce_field(section, &sub_path, sub, raw, issues)
                }
            };
            entry.insert(sub.name.to_string(), value);
        }
        entries.push(Value::Object(entry));
    }

    Value::Array(entries)
}

fn coerce_scalar(kind: &FieldKind, raw: &Value) -> Result<Value, String> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        FieldKind::Text => coerce_text(raw),
        FieldKind::Integer => coerce_integer(raw),
        FieldKind::Number => coerce_number(raw),
        FieldKind::Boolean => coerce_boolean(raw),
        FieldKind::Choice(options) => coerce_choice(options, raw),
        FieldKind::Group(_) => Err("nested list where a single value was expected".to_string()),
    }
}

fn coerce_text(raw: &Value) -> Result<Value, String> {
    match raw {
        Value::String(s) if is_unknown(s) => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) if !is_unknown(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(parts.join("; ")))
            }
        }
        other => Err(format!("expected text, got {}", type_name(other))),
    }
}

fn coerce_integer(raw: &Value) -> Result<Value, String> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if is_unknown(s) => return Ok(Value::Null),
        Value::String(s) => leading_number(s),
        other => return Err(format!("expected an integer, got {}", type_name(other))),
    };

    match number {
        Some(n) if n.fract() == 0.0 => Ok(Value::Number(Number::from(n as i64))),
        Some(n) => Err(format!("expected an integer, got {n}")),
        None => Err(format!("expected an integer, got {raw}")),
    }
}

fn coerce_number(raw: &Value) -> Result<Value, String> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if is_unknown(s) => return Ok(Value::Null),
        Value::String(s) => leading_number(s),
        other => return Err(format!("expected a number, got {}", type_name(other))),
    };

    number
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("expected a number, got {raw}"))
}

fn coerce_boolean(raw: &Value) -> Result<Value, String> {
    match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "present" | "identified" | "positive" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "absent" | "not identified" | "negative" => Ok(Value::Bool(false)),
            other if is_absent(other) => Ok(Value::Null),
            other => Err(format!("expected yes/no, got '{other}'")),
        },
        other => Err(format!("expected yes/no, got {}", type_name(other))),
    }
}

fn coerce_choice(options: &[&str], raw: &Value) -> Result<Value, String> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(format!("expected one of {options:?}, got {}", type_name(other))),
    };

    // Declared values win over unknown markers ("not applicable" is a real pM value).
    if let Some(option) = match_option(options, &text) {
        return Ok(Value::String(option.to_string()));
    }
    if is_absent(&text) {
        return Ok(Value::Null);
    }
    Err(format!("'{text}' is not one of {options:?}"))
}

fn match_option<'a>(options: &[&'a str], text: &str) -> Option<&'a str> {
    if let Some(exact) = options.iter().copied().find(|o| o.eq_ignore_ascii_case(text)) {
        return Some(exact);
    }

    let squashed = squash(text);
    options.iter().copied().find(|o| squash(o) == squashed)
}

/// Lowercase and drop everything but letters, digits and parentheses, so
/// "PT2a" ~ "pT2a" and "Not-identified" ~ "not identified".
fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '(' | ')' | '+'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn is_unknown(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    UNKNOWN_MARKERS.contains(&lowered.as_str())
}

/// For choices, yes/no answers and lists "none" means nothing was reported.
/// Free text keeps it, e.g. a treatment effect of "none".
fn is_absent(text: &str) -> bool {
    is_unknown(text) || text.trim().eq_ignore_ascii_case("none")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TRIAGE;
    use crate::schema::{CancerType, SchemaRegistry};
    use serde_json::json;

    fn lung_section(name: &str) -> SectionSpec {
        let registry = SchemaRegistry::load().unwrap();
        *registry.get(CancerType::Lung).unwrap().section(name).unwrap()
    }

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here is the result:\n```json\n{\"cancer_excision_report\": true}\n```\nDone.";
        let object = extract_json_object(reply).unwrap();
        assert_eq!(object["cancer_excision_report"], json!(true));
    }

    #[test]
    fn test_extract_json_from_surrounding_prose() {
        let reply = "Sure. {\"a\": {\"b\": 1}} Hope this helps.";
        let object = extract_json_object(reply).unwrap();
        assert_eq!(object["a"], json!({"b": 1}));
    }

    #[test]
    fn test_unparseable_reply_is_flagged_not_raised() {
        let section = lung_section("staging");
        let validated = validate_section(&section, "I could not find a stage.");

        assert_eq!(validated.validity, Validity::Invalid(InvalidReason::Unparseable));
        let keys: Vec<_> = validated.values.keys().map(String::as_str).collect();
        let mut expected: Vec<_> = section.field_names().collect();
        expected.sort();
        assert_eq!(keys, expected);
        assert!(validated.values.values().all(Value::is_null));
    }

    #[test]
    fn test_object_without_declared_fields_is_schema_mismatch() {
        let section = lung_section("staging");
        let validated = validate_section(&section, r#"{"diagnosis": "adenocarcinoma"}"#);

        assert_eq!(validated.validity, Validity::Invalid(InvalidReason::NoSchemaFields));
    }

    #[test]
    fn test_extraneous_fields_dropped() {
        let validated = validate_section(
            &TRIAGE,
            r#"{"cancer_excision_report": true, "cancer_category": "lung",
                "cancer_category_others_description": null, "confidence": 0.9, "reasoning": "..."}"#,
        );

        assert_eq!(validated.validity, Validity::Valid);
        assert_eq!(validated.values.len(), 3);
        assert!(!validated.values.contains_key("confidence"));
        assert!(!validated.values.contains_key("reasoning"));
    }

    #[test]
    fn test_missing_margins_become_empty_list() {
        let section = lung_section("margins");
        let validated = validate_section(&section, r#"{"closest_margin": null}"#);

        assert_eq!(validated.values["margins"], json!([]));
        assert_eq!(validated.values["closest_margin_distance_mm"], Value::Null);
        assert_eq!(validated.validity, Validity::Partial);
    }

    #[test]
    fn test_group_entries_validated_independently() {
        let section = lung_section("margins");
        let reply = json!({
            "margins": [
                {"margin_name": "Bronchial", "margin_status": "Uninvolved", "distance_mm": "15 mm", "extra": 1},
                "vascular margin free",
                {"margin_name": "parenchymal", "margin_status": "maybe", "distance_mm": 4}
            ],
            "closest_margin": "parenchymal",
            "closest_margin_distance_mm": 4
        })
        .to_string();

        let validated = validate_section(&section, &reply);
        let margins = validated.values["margins"].as_array().unwrap();

        assert_eq!(margins.len(), 2);
        assert_eq!(
            margins[0],
            json!({"margin_name": "Bronchial", "margin_status": "uninvolved", "distance_mm": 15.0, "involved_by": null})
        );
        assert_eq!(margins[1]["margin_status"], Value::Null);
        assert_eq!(margins[1]["distance_mm"], json!(4.0));

        let fields: Vec<_> = validated.issues.iter().filter_map(|i| i.field.as_deref()).collect();
        assert!(fields.contains(&"margins[1]"));
        assert!(fields.contains(&"margins[2].margin_status"));
        assert_eq!(validated.validity, Validity::Partial);
    }

    #[test]
    fn test_single_group_object_is_wrapped() {
        let section = lung_section("biomarkers");
        let validated = validate_section(
            &section,
            r#"{"biomarkers": {"biomarker": "PD-L1", "result": "TPS 60%", "method": "IHC 22C3"}}"#,
        );

        assert_eq!(validated.values["biomarkers"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scalar_coercions() {
        let section = lung_section("nonnested");
        let reply = json!({
            "Procedure": "Lobectomy",
            "specimen laterality": "RIGHT",
            "tumor_site": "  right upper lobe ",
            "histologic_type": "invasive adenocarcinoma",
            "histologic_grade": "g2",
            "tumor_size_cm": "3.2 x 2.1 x 1.8 cm",
            "invasive_size_cm": 2.5,
            "tumor_focality": "single focus",
            "visceral_pleural_invasion": "Not Identified",
            "lymphovascular_invasion": "not-identified",
            "spread_through_air_spaces": "Not specified",
            "direct_invasion": "N/A",
            "treatment_effect": null
        })
        .to_string();

        let v = validate_section(&section, &reply);

        assert_eq!(v.validity, Validity::Valid, "{:?}", v.issues);
        assert_eq!(v.values["procedure"], json!("lobectomy"));
        assert_eq!(v.values["specimen_laterality"], json!("right"));
        assert_eq!(v.values["tumor_site"], json!("right upper lobe"));
        assert_eq!(v.values["histologic_grade"], json!("G2"));
        assert_eq!(v.values["tumor_size_cm"], json!(3.2));
        assert_eq!(v.values["visceral_pleural_invasion"], json!("not identified"));
        assert_eq!(v.values["lymphovascular_invasion"], json!("not identified"));
        assert_eq!(v.values["spread_through_air_spaces"], Value::Null);
        assert_eq!(v.values["direct_invasion"], Value::Null);
    }

    #[test]
    fn test_not_applicable_kept_when_declared() {
        let section = lung_section("staging");
        let v = validate_section(
            &section,
            r#"{"tnm_descriptors": null, "pathologic_t": "PT2A", "pathologic_n": "pN0", "pathologic_m": "Not applicable"}"#,
        );

        assert_eq!(v.values["pathologic_t"], json!("pT2a"));
        assert_eq!(v.values["pathologic_m"], json!("not applicable"));
    }

    #[test]
    fn test_integer_and_boolean_coercion() {
        let section = lung_section("lymph_nodes");
        let v = validate_section(
            &section,
            r#"{"regional_nodes_examined": "12 nodes", "regional_nodes_involved": 1.5, "lymph_nodes": []}"#,
        );
        assert_eq!(v.values["regional_nodes_examined"], json!(12));
        assert_eq!(v.values["regional_nodes_involved"], Value::Null);
        assert_eq!(v.validity, Validity::Partial);

        let triage = validate_section(
            &TRIAGE,
            r#"{"cancer_excision_report": "Yes", "cancer_category": "Lung", "cancer_category_others_description": "n/a"}"#,
        );
        assert_eq!(triage.values["cancer_excision_report"], json!(true));
        assert_eq!(triage.values["cancer_category"], json!("lung"));
        assert_eq!(triage.values["cancer_category_others_description"], Value::Null);
    }

    #[test]
    fn test_none_is_a_finding_only_in_free_text() {
        let section = lung_section("nonnested");
        let v = validate_section(
            &section,
            r#"{"procedure": "lobectomy", "treatment_effect": "None", "visceral_pleural_invasion": "none"}"#,
        );
        assert_eq!(v.values["treatment_effect"], json!("None"));
        assert_eq!(v.values["visceral_pleural_invasion"], Value::Null);

        let margins = validate_section(&lung_section("margins"), r#"{"margins": "none"}"#);
        assert_eq!(margins.values["margins"], json!([]));
    }
}
