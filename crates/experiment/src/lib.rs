pub mod config;
pub mod driver;
pub mod logging;
pub mod output;
pub mod summary;

pub use config::{ConfigError, DEFAULT_INPUT_DIR, PipelineConfig};
pub use driver::{Driver, FailureKind, ReportFailure, ReportOutcome, ReportStage, ReportStatus};
pub use output::{ExperimentDir, TimingLog};
pub use summary::RunSummary;

use extract::{CancerType, Extractor, LanguageModel, SchemaRegistry};
use std::sync::Arc;

/// Build a driver from a validated configuration and any model adapter.
pub fn build_driver(
    config: &PipelineConfig,
    model: Arc<dyn LanguageModel>,
    forced: Option<CancerType>,
) -> Result<Driver, ConfigError> {
    config.validate()?;
    let registry = Arc::new(SchemaRegistry::load()?);
    let extractor = Extractor::new(model, registry, config.extractor_options());
    Ok(Driver::new(extractor, forced))
}
