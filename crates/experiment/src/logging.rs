use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `extract=debug`.
    pub level: String,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Install the global subscriber: console plus an optional log file, both
/// plain text or both JSON lines.
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("Invalid log filter '{}'", settings.level))?,
    };

    let console = if settings.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let file_layer = match &settings.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
            Some(if settings.json {
                layer.json().boxed()
            } else {
                layer.boxed()
            })
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Logging already initialised")?;

    Ok(())
}
