use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand};
use experiment::config::{DEFAULT_INPUT_DIR, MODELS, PipelineConfig};
use experiment::logging::{self, LogSettings};
use experiment::{ExperimentDir, RunSummary, build_driver};
use extract::{CancerType, OllamaClient};
use ingest::Report;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Extract CAP cancer-registry fields from pathology reports with a local
/// Ollama model.
#[derive(Parser, Debug)]
#[command(name = "registrar", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file, applied over the defaults (replaces --preset); flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model alias (run `registrar models` to list)
    #[arg(long, global = true, env = "REGISTRAR_MODEL")]
    model: Option<String>,

    /// Ollama server, e.g. http://localhost:11434
    #[arg(long, global = true, env = "OLLAMA_HOST")]
    ollama_url: Option<String>,

    /// Seconds to wait for a single model call
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Folder in which the experiment_<timestamp> folder is created
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Start from a preset instead of the defaults
    #[arg(long, global = true, value_parser = ["fast", "thorough"])]
    preset: Option<String>,

    /// Skip the rough-structuring pass
    #[arg(long, global = true)]
    no_structuring: bool,

    /// Fail a report when any of its sections is unusable
    #[arg(long, global = true)]
    strict: bool,

    /// Skip triage and extract every report as this cancer type
    #[arg(long, global = true)]
    cancer_type: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every report in one or more folders
    Batch(BatchArgs),

    /// Extract a random sample of reports from a folder
    Sample(SampleArgs),

    /// Extract a single report file or literal text
    Single(SingleArgs),

    /// List model aliases and their Ollama tags
    Models,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Folder(s) of .txt reports; several folders get numbered output subfolders
    #[arg(long = "input", default_value = DEFAULT_INPUT_DIR)]
    inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Number of reports to draw
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "text"])))]
struct SingleArgs {
    /// Report file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Report text given inline
    #[arg(long)]
    text: Option<String>,

    /// Report id used for --text
    #[arg(long, default_value = "inline")]
    label: String,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match self.preset.as_deref() {
            Some("fast") => PipelineConfig::fast(),
            Some("thorough") => PipelineConfig::thorough(),
            _ => PipelineConfig::default(),
        };

        if let Some(path) = &self.config {
            config = PipelineConfig::from_file(path)?;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.set_ollama_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if self.no_structuring {
            config.structure_first = false;
        }
        if self.strict {
            config.keep_partial = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Models = cli.command {
        for (alias, tag) in MODELS {
            println!("{alias:<10} {tag}");
        }
        return Ok(());
    }

    let config = cli.pipeline_config()?;
    let model_tag = config.model_tag()?;
    let forced = cli
        .cancer_type
        .as_deref()
        .map(str::parse::<CancerType>)
        .transpose()
        .context("Unsupported --cancer-type")?;

    let out = ExperimentDir::create(&config.output_root)?;
    logging::init(&LogSettings {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        file: Some(out.log_path()),
    })?;

    let started_at = Utc::now().to_rfc3339();
    info!(
        model = model_tag,
        ollama = %config.ollama_url,
        output = %out.path().display(),
        structure_first = config.structure_first,
        keep_partial = config.keep_partial,
        "Experiment setup"
    );
    out.write_json("config.json", &config)?;

    let client = OllamaClient::new(
        config.ollama_url.clone(),
        model_tag,
        config.generation.clone(),
        config.timeout(),
    )?;
    match client.available_models().await {
        Ok(models) if !models.iter().any(|m| m == model_tag) => {
            warn!(model = model_tag, "Model not installed on the server; calls will fail")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Could not query the inference server"),
    }

    let driver = build_driver(&config, Arc::new(client), forced)?;

    let (inputs, outcomes) = match &cli.command {
        Command::Batch(args) => (args.inputs.clone(), driver.run_batch(&args.inputs, &out).await?),
        Command::Sample(args) => (
            vec![args.input.clone()],
            driver.run_sample(&args.input, args.count, args.seed, &out).await?,
        ),
        Command::Single(args) => match (&args.file, &args.text) {
            (Some(path), _) => (vec![path.clone()], vec![driver.run_path(path, &out).await]),
            (None, Some(text)) => {
                let report = Report::from_text(args.label.clone(), text.clone());
                (vec![PathBuf::from(&args.label)], vec![driver.run_report(&report, &out).await])
            }
            (None, None) => bail!("single needs --file or --text"),
        },
        Command::Models => return Ok(()),
    };

    let summary = RunSummary::from_outcomes(
        driver.model_name(),
        started_at,
        inputs.iter().map(|p| p.display().to_string()).collect(),
        &outcomes,
    );
    let summary_path = summary.write(&out)?;

    info!(
        total = summary.total_reports,
        persisted = summary.persisted,
        failed = summary.failed,
        avg_seconds = summary.avg_elapsed_seconds,
        summary = %summary_path.display(),
        "Experiment finished"
    );
    for failure in &summary.failures {
        warn!(report = %failure.report_id, kind = %failure.kind, stage = %failure.stage, "Failed report");
    }

    Ok(())
}
