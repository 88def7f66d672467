use extract::{ExtractorOptions, GenerationOptions, SchemaError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Folder read when no `--input` is given.
pub const DEFAULT_INPUT_DIR: &str = "./reports";

pub const DEFAULT_MODEL: &str = "gpt";

/// Short model names accepted on the command line, with their Ollama tags.
pub const MODELS: &[(&str, &str)] = &[
    ("gemma4b", "gemma3:4b"),
    ("gemma1b", "gemma3:1b"),
    ("med8b", "thewindmom/llama3-med42-8b"),
    ("gemma12b", "gemma3:12b"),
    ("gemma27b", "gemma3:27b"),
    ("med70b", "thewindmom/llama3-med42-70b"),
    ("gpt", "gpt-oss:20b"),
    ("phi4", "phi4"),
    ("qwen30b", "qwen3:30b"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown model '{name}' (available: {available})")]
    UnknownModel { name: String, available: String },

    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request timeout must be at least one second")]
    InvalidTimeout,

    #[error("Schema catalog failed to load: {0}")]
    Schema(#[from] SchemaError),
}

/// Resolve an alias (or a known tag) to the Ollama model tag.
pub fn resolve_model(name: &str) -> Result<&'static str, ConfigError> {
    let wanted = name.trim();
    MODELS
        .iter()
        .find(|(alias, tag)| alias.eq_ignore_ascii_case(wanted) || *tag == wanted)
        .map(|(_, tag)| *tag)
        .ok_or_else(|| ConfigError::UnknownModel {
            name: name.to_string(),
            available: MODELS
                .iter()
                .map(|(alias, _)| *alias)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Everything fixed at setup for one run, passed explicitly to the driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: String,
    pub ollama_url: String,
    pub request_timeout_secs: u64,
    pub generation: GenerationOptions,
    pub structure_first: bool,
    pub keep_partial: bool,
    pub output_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_url: extract::llm::DEFAULT_OLLAMA_URL.to_string(),
            request_timeout_secs: 600,
            generation: GenerationOptions::default(),
            structure_first: true,
            keep_partial: true,
            output_root: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Skip rough structuring and give up on slow calls sooner.
    pub fn fast() -> Self {
        Self {
            request_timeout_secs: 120,
            structure_first: false,
            ..Self::default()
        }
    }

    /// For the large models, which can take many minutes per section.
    pub fn thorough() -> Self {
        Self {
            request_timeout_secs: 1800,
            ..Self::default()
        }
    }

    /// Overlay a JSON file on the defaults. Missing keys keep their default.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        resolve_model(&self.model)?;
        Ok(())
    }

    pub fn model_tag(&self) -> Result<&'static str, ConfigError> {
        resolve_model(&self.model)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn extractor_options(&self) -> ExtractorOptions {
        ExtractorOptions {
            structure_first: self.structure_first,
            keep_partial: self.keep_partial,
        }
    }

    /// Accepts `OLLAMA_HOST`-style values such as `gpu-box:11434`.
    pub fn set_ollama_url(&mut self, value: &str) {
        let trimmed = value.trim().trim_end_matches('/');
        self.ollama_url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_model_is_gpt_oss() {
        let config = PipelineConfig::default();
        assert_eq!(config.model_tag().unwrap(), "gpt-oss:20b");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_lists_aliases() {
        let err = resolve_model("llama99").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("llama99"));
        assert!(message.contains("gemma4b"));
        assert!(message.contains("qwen30b"));
    }

    #[test]
    fn test_aliases_and_tags_resolve() {
        assert_eq!(resolve_model("MED8B").unwrap(), "thewindmom/llama3-med42-8b");
        assert_eq!(resolve_model("gemma3:27b").unwrap(), "gemma3:27b");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"model": "phi4", "generation": {{"temperature": 0.0}}}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();

        assert_eq!(config.model, "phi4");
        assert_eq!(config.generation.temperature, 0.0);
        assert_eq!(config.generation.num_ctx, 16384);
        assert!(config.structure_first);
        assert_eq!(config.request_timeout_secs, 600);
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "model = phi4").unwrap();

        assert!(matches!(
            PipelineConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig {
            request_timeout_secs: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_presets() {
        assert!(!PipelineConfig::fast().structure_first);
        assert!(PipelineConfig::thorough().request_timeout_secs > PipelineConfig::default().request_timeout_secs);
    }

    #[test]
    fn test_ollama_host_without_scheme() {
        let mut config = PipelineConfig::default();
        config.set_ollama_url("gpu-box:11434/");
        assert_eq!(config.ollama_url, "http://gpu-box:11434");

        config.set_ollama_url("https://ollama.internal");
        assert_eq!(config.ollama_url, "https://ollama.internal");
    }
}
