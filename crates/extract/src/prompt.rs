use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt::Write;

use crate::schema::{CancerType, FieldKind, FieldSpec, SectionSpec};

const SYSTEM_PROMPT: &str = "You are an experienced cancer registrar abstracting surgical pathology \
reports into CAP protocol registry fields. You answer with a single JSON object and nothing else.";

/// A fully built request for one model invocation.
///
/// `format` is either a JSON Schema object constraining the reply, the string
/// `"json"` for any JSON object, or `None` for plain text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub task: String,
    pub system: String,
    pub prompt: String,
    pub format: Option<Value>,
}

/// Request for one schema section. `context` is the rough-structured draft of
/// the report, passed to organ sections when available.
pub fn build_section_request(
    section: &SectionSpec,
    paragraphs: &[String],
    context: Option<&Value>,
) -> ModelRequest {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "TASK:\n{}\n", section.instruction);
    write_paragraphs(&mut prompt, paragraphs);

    if let Some(context) = context.filter(|c| !is_empty_object(c)) {
        let draft = serde_json::to_string_pretty(context).unwrap_or_default();
        let _ = writeln!(prompt, "STRUCTURED DRAFT OF THE REPORT:\n{draft}\n");
    }

    prompt.push_str("FIELDS:\n");
    for field in section.fields {
        write_field(&mut prompt, field, "");
    }

    let keys: Vec<&str> = section.field_names().collect();
    let _ = write!(
        prompt,
        r#"
RULES:
- Output ONLY a JSON object with exactly these keys: {}
- Use null when the report does not state a value; use [] for a list with no entries
- For choice fields, answer with one of the listed values exactly as written
- Keep the report's original wording for text fields
- Do not add keys that are not listed, no markdown, no explanations

JSON OUTPUT:"#,
        keys.join(", ")
    );

    ModelRequest {
        task: section.name.to_string(),
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        format: Some(section_json_schema(section)),
    }
}

/// Request that turns the report into a loosely structured JSON draft.
pub fn build_structuring_request(paragraphs: &[String], cancer_type: CancerType) -> ModelRequest {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "TASK:\nThis is a {cancer_type} cancer excision report. Convert it into a structured JSON \
object. Group related findings under descriptive keys, keep the original wording of every \
finding, and do not interpret or summarize.\n"
    );
    write_paragraphs(&mut prompt, paragraphs);
    prompt.push_str("JSON OUTPUT:");

    ModelRequest {
        task: "structuring".to_string(),
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        format: Some(Value::String("json".to_string())),
    }
}

fn write_paragraphs(prompt: &mut String, paragraphs: &[String]) {
    prompt.push_str("REPORT:\n");
    for (index, paragraph) in paragraphs.iter().enumerate() {
        let _ = writeln!(prompt, "[{}] {}", index + 1, paragraph);
    }
    prompt.push('\n');
}

fn write_field(prompt: &mut String, field: &FieldSpec, indent: &str) {
    match field.kind {
        FieldKind::Choice(options) => {
            let quoted: Vec<String> = options.iter().map(|o| format!("\"{o}\"")).collect();
            let _ = writeln!(
                prompt,
                "{indent}- {} (one of: {}): {}",
                field.name,
                quoted.join(", "),
                field.description
            );
        }
        FieldKind::Group(sub_fields) => {
            let _ = writeln!(
                prompt,
                "{indent}- {} (list): {}. Emit one entry per item found, each an object with:",
                field.name, field.description
            );
            let nested = format!("{indent}    ");
            for sub in sub_fields {
                write_field(prompt, sub, &nested);
            }
        }
        kind => {
            let _ = writeln!(
                prompt,
                "{indent}- {} ({}): {}",
                field.name,
                kind.label(),
                field.description
            );
        }
    }
}

/// JSON Schema for a section's reply, used as Ollama's `format` constraint.
pub fn section_json_schema(section: &SectionSpec) -> Value {
    object_schema(section.fields)
}

fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(field.name.to_string(), field_schema(field));
    }
    let required: Vec<&str> = fields.iter().map(|f| f.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn field_schema(field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::Text => json!({ "type": ["string", "null"] }),
        FieldKind::Integer => json!({ "type": ["integer", "null"] }),
        FieldKind::Number => json!({ "type": ["number", "null"] }),
        FieldKind::Boolean => json!({ "type": ["boolean", "null"] }),
        FieldKind::Choice(options) => {
            let mut allowed: Vec<Value> = options.iter().map(|o| json!(o)).collect();
            allowed.push(Value::Null);
            json!({ "type": ["string", "null"], "enum": allowed })
        }
        FieldKind::Group(sub_fields) => json!({
            "type": "array",
            "items": object_schema(sub_fields),
        }),
    }
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TRIAGE;
    use crate::schema::SchemaRegistry;

    fn paragraphs() -> Vec<String> {
        vec![
            "Right upper lobe, lobectomy: invasive adenocarcinoma, 3.2 cm.".to_string(),
            "Bronchial margin free of tumor (1.5 cm).".to_string(),
        ]
    }

    #[test]
    fn test_same_input_builds_identical_request() {
        let registry = SchemaRegistry::load().unwrap();
        let context = json!({"diagnosis": "adenocarcinoma"});

        for cancer_type in CancerType::ALL {
            for section in registry.get(cancer_type).unwrap().sections {
                let first = build_section_request(section, &paragraphs(), Some(&context));
                let second = build_section_request(section, &paragraphs(), Some(&context));
                assert_eq!(first, second, "{cancer_type}/{}", section.name);
                assert_eq!(section_json_schema(section), section_json_schema(section));
            }
        }
    }

    #[test]
    fn test_prompt_enumerates_every_field() {
        let registry = SchemaRegistry::load().unwrap();
        let margins = *registry.get(CancerType::Lung).unwrap().section("margins").unwrap();

        let request = build_section_request(&margins, &paragraphs(), None);

        assert_eq!(request.task, "margins");
        assert!(request.prompt.contains("[1] Right upper lobe"));
        assert!(request.prompt.contains("[2] Bronchial margin"));
        assert!(request.prompt.contains("- margins (list):"));
        assert!(request.prompt.contains("Emit one entry per item found"));
        assert!(request.prompt.contains("    - margin_status (one of: \"involved\", \"uninvolved\", \"cannot be assessed\")"));
        assert!(request.prompt.contains("- closest_margin_distance_mm (number):"));
        assert!(!request.prompt.contains("STRUCTURED DRAFT"));
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let request = build_section_request(&TRIAGE, &paragraphs(), Some(&json!({})));
        assert!(!request.prompt.contains("STRUCTURED DRAFT"));

        let request = build_section_request(&TRIAGE, &paragraphs(), Some(&json!({"a": 1})));
        assert!(request.prompt.contains("STRUCTURED DRAFT"));
    }

    #[test]
    fn test_json_schema_covers_groups_and_choices() {
        let registry = SchemaRegistry::load().unwrap();
        let margins = *registry.get(CancerType::Lung).unwrap().section("margins").unwrap();

        let schema = section_json_schema(&margins);

        assert_eq!(schema["required"], json!(["margins", "closest_margin", "closest_margin_distance_mm"]));
        assert_eq!(schema["properties"]["margins"]["type"], json!("array"));
        let status = &schema["properties"]["margins"]["items"]["properties"]["margin_status"];
        assert_eq!(status["enum"], json!(["involved", "uninvolved", "cannot be assessed", null]));
    }

    #[test]
    fn test_structuring_request_asks_for_any_json() {
        let request = build_structuring_request(&paragraphs(), CancerType::Lung);

        assert_eq!(request.task, "structuring");
        assert_eq!(request.format, Some(json!("json")));
        assert!(request.prompt.contains("lung cancer excision report"));
    }
}
