pub mod catalog;
pub mod error;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod record;
pub mod schema;

pub use error::{ExtractError, SchemaError};
pub use llm::{GenerationOptions, LanguageModel, ModelReply, OllamaClient};
pub use parser::{extract_json_object, validate_section};
pub use prompt::{ModelRequest, build_section_request, build_structuring_request};
pub use record::{FieldIssue, InvalidReason, StructuredRecord, ValidatedSection, Validity};
pub use schema::{CancerSchema, CancerType, FieldKind, FieldSpec, SchemaRegistry, SectionSpec};

use ingest::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ExtractorOptions {
    /// Run the rough-structuring pass and feed its draft to every section.
    pub structure_first: bool,
    /// Keep records where some (not all) sections came back invalid.
    pub keep_partial: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            structure_first: true,
            keep_partial: true,
        }
    }
}

/// Latency of one model call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationTiming {
    pub task: String,
    pub elapsed_seconds: f64,
}

/// What one report produced, including the calls made before any failure.
#[derive(Debug)]
pub struct Extraction {
    pub invocations: Vec<InvocationTiming>,
    pub outcome: Result<StructuredRecord, ExtractError>,
}

/// Runs triage, optional rough structuring and every organ section for one
/// report.
pub struct Extractor {
    model: Arc<dyn LanguageModel>,
    registry: Arc<SchemaRegistry>,
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<SchemaRegistry>,
        options: ExtractorOptions,
    ) -> Self {
        Self {
            model,
            registry,
            options,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Extract one report. With `forced` set, triage is skipped and that
    /// cancer type's schema is used directly.
    pub async fn extract(&self, report: &Report, forced: Option<CancerType>) -> Extraction {
        let mut invocations = Vec::new();
        let outcome = self.run(report, forced, &mut invocations).await;
        Extraction {
            invocations,
            outcome,
        }
    }

    async fn run(
        &self,
        report: &Report,
        forced: Option<CancerType>,
        invocations: &mut Vec<InvocationTiming>,
    ) -> Result<StructuredRecord, ExtractError> {
        let paragraphs = report.paragraphs();

        let (cancer_type, mut issues) = match forced {
            Some(cancer_type) => (cancer_type, Vec::new()),
            None => {
                let triage = self.triage(report, &paragraphs, invocations).await?;
                match triage {
                    Triage::Done(record) => return Ok(record),
                    Triage::Organ(cancer_type, issues) => (cancer_type, issues),
                }
            }
        };

        let schema = self.registry.get(cancer_type)?;
        info!(report = %report.id, cancer = %cancer_type, sections = schema.sections.len(), "Extracting organ sections");

        let context = if self.options.structure_first {
            Some(self.structure(report, &paragraphs, cancer_type, invocations).await?)
        } else {
            None
        };

        let mut cancer_data = Map::new();
        let mut invalid = Vec::new();

        for section in schema.sections {
            let request = build_section_request(section, &paragraphs, context.as_ref());
            let reply = self.invoke(report, &request, invocations).await?;
            let validated = validate_section(section, &reply.content);

            if let Validity::Invalid(reason) = validated.validity {
                warn!(report = %report.id, section = section.name, ?reason, "Section reply unusable");
                invalid.push((section.name, reason));
            }

            cancer_data.extend(validated.values);
            issues.extend(validated.issues);
        }

        let all_invalid = invalid.len() == schema.sections.len();
        if let Some(&(section, reason)) = invalid.first() {
            if all_invalid || !self.options.keep_partial {
                return Err(invalid_reply(section, reason));
            }
        }

        Ok(StructuredRecord {
            report_id: report.id.clone(),
            cancer_excision_report: true,
            cancer_category: Some(cancer_type.to_string()),
            cancer_category_others_description: None,
            cancer_data,
            valid: invalid.is_empty(),
            issues,
        })
    }

    async fn triage(
        &self,
        report: &Report,
        paragraphs: &[String],
        invocations: &mut Vec<InvocationTiming>,
    ) -> Result<Triage, ExtractError> {
        let request = build_section_request(&catalog::TRIAGE, paragraphs, None);
        let reply = self.invoke(report, &request, invocations).await?;
        let triage = validate_section(&catalog::TRIAGE, &reply.content);

        if let Validity::Invalid(reason) = triage.validity {
            return Err(invalid_reply(catalog::TRIAGE.name, reason));
        }

        let text = |key: &str| triage.values.get(key).and_then(Value::as_str).map(str::to_string);
        let Some(eligible) = triage.values.get("cancer_excision_report").and_then(Value::as_bool) else {
            return Err(ExtractError::SchemaMismatch(format!(
                "section '{}': reply does not say whether this is a cancer excision report",
                catalog::TRIAGE.name
            )));
        };
        let category = text("cancer_category");
        let description = text("cancer_category_others_description");

        info!(report = %report.id, eligible, category = ?category, "Triage done");

        if !eligible {
            let mut record = StructuredRecord::not_eligible(&report.id);
            record.issues = triage.issues;
            return Ok(Triage::Done(record));
        }

        let mut record = StructuredRecord {
            report_id: report.id.clone(),
            cancer_excision_report: true,
            cancer_category: category.clone(),
            cancer_category_others_description: None,
            cancer_data: Map::new(),
            valid: true,
            issues: triage.issues,
        };

        match category.as_deref() {
            None => {
                record.valid = false;
                record.issues.push(FieldIssue::new(
                    catalog::TRIAGE.name,
                    Some("cancer_category".to_string()),
                    "eligible excision without a cancer category",
                ));
                Ok(Triage::Done(record))
            }
            Some(catalog::CATEGORY_OTHERS) => {
                record.cancer_category_others_description = description;
                Ok(Triage::Done(record))
            }
            Some(identifier) => {
                let cancer_type: CancerType = identifier.parse()?;
                Ok(Triage::Organ(cancer_type, record.issues))
            }
        }
    }

    /// Rough structuring pass. A reply without a JSON object yields `{}`.
    async fn structure(
        &self,
        report: &Report,
        paragraphs: &[String],
        cancer_type: CancerType,
        invocations: &mut Vec<InvocationTiming>,
    ) -> Result<Value, ExtractError> {
        let request = build_structuring_request(paragraphs, cancer_type);
        let reply = self.invoke(report, &request, invocations).await?;

        match extract_json_object(&reply.content) {
            Some(draft) => Ok(Value::Object(draft)),
            None => {
                warn!(report = %report.id, "Structuring reply is not JSON, continuing without draft");
                Ok(Value::Object(Map::new()))
            }
        }
    }

    async fn invoke(
        &self,
        report: &Report,
        request: &ModelRequest,
        invocations: &mut Vec<InvocationTiming>,
    ) -> Result<ModelReply, ExtractError> {
        debug!(report = %report.id, task = %request.task, prompt_chars = request.prompt.len(), "Invoking model");
        let reply = self.model.invoke(request).await?;

        info!(
            report = %report.id,
            task = %request.task,
            elapsed_ms = reply.elapsed.as_millis() as u64,
            "Model call finished"
        );
        invocations.push(InvocationTiming {
            task: request.task.clone(),
            elapsed_seconds: reply.elapsed.as_secs_f64(),
        });
        Ok(reply)
    }
}

enum Triage {
    /// No organ extraction needed; the record is final.
    Done(StructuredRecord),
    Organ(CancerType, Vec<FieldIssue>),
}

fn invalid_reply(section: &str, reason: InvalidReason) -> ExtractError {
    match reason {
        InvalidReason::Unparseable => {
            ExtractError::MalformedReply(format!("section '{section}': no JSON object in reply"))
        }
        InvalidReason::NoSchemaFields => ExtractError::SchemaMismatch(format!(
            "section '{section}': reply has none of the declared fields"
        )),
    }
}
