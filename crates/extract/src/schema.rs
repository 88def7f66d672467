use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog;
use crate::error::{ExtractError, SchemaError};

/// Primitive type constraint of one extractable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    /// One of a closed set of values, matched case-insensitively.
    Choice(&'static [&'static str]),
    /// Repeated structure: zero or more entries, each with these sub-fields.
    Group(&'static [FieldSpec]),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Choice(_) => "choice",
            FieldKind::Group(_) => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Text }
    }

    pub const fn integer(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Integer }
    }

    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Number }
    }

    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Boolean }
    }

    pub const fn choice(
        name: &'static str,
        options: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self { name, description, kind: FieldKind::Choice(options) }
    }

    pub const fn group(
        name: &'static str,
        fields: &'static [FieldSpec],
        description: &'static str,
    ) -> Self {
        Self { name, description, kind: FieldKind::Group(fields) }
    }
}

/// A block of fields extracted by one model invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSpec {
    pub name: &'static str,
    pub instruction: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CancerType {
    Stomach,
    Colorectal,
    Breast,
    Esophagus,
    Lung,
    Prostate,
    Thyroid,
    Pancreas,
    Cervix,
    Liver,
}

impl CancerType {
    pub const ALL: [CancerType; 10] = [
        CancerType::Stomach,
        CancerType::Colorectal,
        CancerType::Breast,
        CancerType::Esophagus,
        CancerType::Lung,
        CancerType::Prostate,
        CancerType::Thyroid,
        CancerType::Pancreas,
        CancerType::Cervix,
        CancerType::Liver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CancerType::Stomach => "stomach",
            CancerType::Colorectal => "colorectal",
            CancerType::Breast => "breast",
            CancerType::Esophagus => "esophagus",
            CancerType::Lung => "lung",
            CancerType::Prostate => "prostate",
            CancerType::Thyroid => "thyroid",
            CancerType::Pancreas => "pancreas",
            CancerType::Cervix => "cervix",
            CancerType::Liver => "liver",
        }
    }
}

impl fmt::Display for CancerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CancerType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "colon" {
            return Ok(CancerType::Colorectal);
        }
        CancerType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ExtractError::SchemaNotFound(s.to_string()))
    }
}

/// Everything extractable for one cancer type, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CancerSchema {
    pub cancer_type: CancerType,
    pub sections: &'static [SectionSpec],
}

impl CancerSchema {
    /// Top-level field names across all sections, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name))
            .collect()
    }

    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Read-only lookup table from cancer type to field schema.
pub struct SchemaRegistry {
    schemas: HashMap<CancerType, CancerSchema>,
}

impl SchemaRegistry {
    /// Load and validate the built-in catalog.
    pub fn load() -> Result<Self, SchemaError> {
        let registry = Self::from_schemas(catalog::ALL_SCHEMAS)?;
        validate_section("triage", &catalog::TRIAGE)?;

        for cancer_type in CancerType::ALL {
            if !registry.schemas.contains_key(&cancer_type) {
                return Err(SchemaError::MissingCancerType(cancer_type.to_string()));
            }
        }

        Ok(registry)
    }

    /// Build a registry from arbitrary declarations, validating each one.
    pub fn from_schemas(schemas: &[CancerSchema]) -> Result<Self, SchemaError> {
        let mut map = HashMap::new();
        for schema in schemas {
            validate_schema(schema)?;
            if map.insert(schema.cancer_type, *schema).is_some() {
                return Err(SchemaError::DuplicateCancerType(schema.cancer_type.to_string()));
            }
        }
        Ok(Self { schemas: map })
    }

    pub fn get(&self, cancer_type: CancerType) -> Result<&CancerSchema, ExtractError> {
        self.schemas
            .get(&cancer_type)
            .ok_or_else(|| ExtractError::SchemaNotFound(cancer_type.to_string()))
    }

    /// Look up by identifier, e.g. `"lung"`. Unknown identifiers fail with
    /// `SchemaNotFound`.
    pub fn lookup(&self, identifier: &str) -> Result<&CancerSchema, ExtractError> {
        let cancer_type: CancerType = identifier.parse()?;
        self.get(cancer_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn validate_schema(schema: &CancerSchema) -> Result<(), SchemaError> {
    let cancer = schema.cancer_type.to_string();
    if schema.sections.is_empty() {
        return Err(SchemaError::EmptySchema(cancer));
    }

    let mut seen = HashSet::new();
    for section in schema.sections {
        validate_section(&cancer, section)?;
        for field in section.fields {
            if !seen.insert(field.name) {
                return Err(SchemaError::DuplicateField {
                    cancer,
                    field: field.name.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_section(cancer: &str, section: &SectionSpec) -> Result<(), SchemaError> {
    if section.fields.is_empty() {
        return Err(SchemaError::EmptySection {
            cancer: cancer.to_string(),
            section: section.name.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for field in section.fields {
        if !seen.insert(field.name) {
            return Err(SchemaError::DuplicateField {
                cancer: cancer.to_string(),
                field: field.name.to_string(),
            });
        }
        validate_field(cancer, field, false)?;
    }
    Ok(())
}

fn validate_field(cancer: &str, field: &FieldSpec, nested: bool) -> Result<(), SchemaError> {
    if !is_snake_case(field.name) {
        return Err(SchemaError::InvalidFieldName {
            cancer: cancer.to_string(),
            field: field.name.to_string(),
        });
    }

    match field.kind {
        FieldKind::Choice(options) => {
            if options.is_empty() {
                return Err(SchemaError::EmptyChoice {
                    cancer: cancer.to_string(),
                    field: field.name.to_string(),
                });
            }
            let mut seen = HashSet::new();
            for option in options {
                if !seen.insert(option.to_lowercase()) {
                    return Err(SchemaError::DuplicateChoice {
                        cancer: cancer.to_string(),
                        field: field.name.to_string(),
                        value: option.to_string(),
                    });
                }
            }
        }
        FieldKind::Group(fields) => {
            if nested {
                return Err(SchemaError::NestedGroup {
                    cancer: cancer.to_string(),
                    field: field.name.to_string(),
                });
            }
            if fields.is_empty() {
                return Err(SchemaError::EmptyGroup {
                    cancer: cancer.to_string(),
                    field: field.name.to_string(),
                });
            }
            let mut seen = HashSet::new();
            for sub in fields {
                if !seen.insert(sub.name) {
                    return Err(SchemaError::DuplicateField {
                        cancer: cancer.to_string(),
                        field: format!("{}.{}", field.name, sub.name),
                    });
                }
                validate_field(cancer, sub, true)?;
            }
        }
        FieldKind::Text | FieldKind::Integer | FieldKind::Number | FieldKind::Boolean => {}
    }
    Ok(())
}

fn is_snake_case(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_type_has_fields() {
        let registry = SchemaRegistry::load().unwrap();
        assert_eq!(registry.len(), 10);

        for cancer_type in CancerType::ALL {
            let schema = registry.get(cancer_type).unwrap();
            assert!(!schema.sections.is_empty(), "{cancer_type} has no sections");
            assert!(!schema.field_names().is_empty(), "{cancer_type} has no fields");
        }
    }

    #[test]
    fn test_unknown_type_is_schema_not_found() {
        let registry = SchemaRegistry::load().unwrap();

        let err = registry.lookup("kidney").unwrap_err();
        assert!(matches!(err, ExtractError::SchemaNotFound(ref t) if t == "kidney"));

        assert!(matches!(
            registry.lookup("others").unwrap_err(),
            ExtractError::SchemaNotFound(_)
        ));
    }

    #[test]
    fn test_lookup_is_case_insensitive_with_colon_alias() {
        let registry = SchemaRegistry::load().unwrap();

        assert_eq!(registry.lookup(" Lung ").unwrap().cancer_type, CancerType::Lung);
        assert_eq!(registry.lookup("colon").unwrap().cancer_type, CancerType::Colorectal);
    }

    #[test]
    fn test_lung_declares_margin_group() {
        let registry = SchemaRegistry::load().unwrap();
        let lung = registry.get(CancerType::Lung).unwrap();

        let margins = lung.section("margins").unwrap();
        let field = margins.field("margins").unwrap();
        assert!(matches!(field.kind, FieldKind::Group(sub) if !sub.is_empty()));
    }

    const SITE_FIELDS: &[FieldSpec] = &[FieldSpec::text("tumor_site", "")];
    const DUPLICATED: &[SectionSpec] = &[
        SectionSpec { name: "a", instruction: "", fields: SITE_FIELDS },
        SectionSpec { name: "b", instruction: "", fields: SITE_FIELDS },
    ];

    #[test]
    fn test_duplicate_field_rejected() {
        let err = SchemaRegistry::from_schemas(&[CancerSchema {
            cancer_type: CancerType::Lung,
            sections: DUPLICATED,
        }])
        .err()
        .unwrap();

        assert_eq!(
            err,
            SchemaError::DuplicateField {
                cancer: "lung".into(),
                field: "tumor_site".into()
            }
        );
    }

    const INNER: &[FieldSpec] = &[FieldSpec::text("x", "")];
    const NESTED: &[FieldSpec] = &[FieldSpec::group("inner", INNER, "")];
    const OUTER: &[FieldSpec] = &[FieldSpec::group("outer", NESTED, "")];
    const BAD_GROUP: &[SectionSpec] = &[SectionSpec { name: "a", instruction: "", fields: OUTER }];

    #[test]
    fn test_nested_group_rejected() {
        let err = SchemaRegistry::from_schemas(&[CancerSchema {
            cancer_type: CancerType::Liver,
            sections: BAD_GROUP,
        }])
        .err()
        .unwrap();

        assert!(matches!(err, SchemaError::NestedGroup { .. }));
    }

    const BAD_NAME_FIELDS: &[FieldSpec] = &[FieldSpec::choice("Tumor Site", &["x"], "")];
    const BAD_NAME: &[SectionSpec] = &[SectionSpec { name: "a", instruction: "", fields: BAD_NAME_FIELDS }];

    #[test]
    fn test_field_names_must_be_snake_case() {
        let err = SchemaRegistry::from_schemas(&[CancerSchema {
            cancer_type: CancerType::Breast,
            sections: BAD_NAME,
        }])
        .err()
        .unwrap();

        assert!(matches!(err, SchemaError::InvalidFieldName { .. }));
    }

    #[test]
    fn test_empty_schema_rejected() {
        let err = SchemaRegistry::from_schemas(&[CancerSchema {
            cancer_type: CancerType::Thyroid,
            sections: &[],
        }])
        .err()
        .unwrap();

        assert_eq!(err, SchemaError::EmptySchema("thyroid".into()));
    }
}
