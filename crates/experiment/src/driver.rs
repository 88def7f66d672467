use anyhow::Result;
use extract::{CancerType, ExtractError, Extractor, InvocationTiming};
use ingest::{FileReader, Report, report_id};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::output::{ExperimentDir, TimingLog, TimingRow};

/// Linear per-report lifecycle. A failure names the stage that could not be
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    Loaded,
    Prompted,
    Invoked,
    Parsed,
    Persisted,
}

impl ReportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStage::Loaded => "loaded",
            ReportStage::Prompted => "prompted",
            ReportStage::Invoked => "invoked",
            ReportStage::Parsed => "parsed",
            ReportStage::Persisted => "persisted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SchemaNotFound,
    EndpointUnreachable,
    InvocationTimeout,
    MalformedReply,
    SchemaMismatch,
    ServerError,
    ReportUnreadable,
    PersistFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::SchemaNotFound => "schema_not_found",
            FailureKind::EndpointUnreachable => "endpoint_unreachable",
            FailureKind::InvocationTimeout => "invocation_timeout",
            FailureKind::MalformedReply => "malformed_reply",
            FailureKind::SchemaMismatch => "schema_mismatch",
            FailureKind::ServerError => "server_error",
            FailureKind::ReportUnreadable => "report_unreadable",
            FailureKind::PersistFailed => "persist_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportFailure {
    pub stage: ReportStage,
    pub kind: FailureKind,
    pub message: String,
}

impl ReportFailure {
    fn new(stage: ReportStage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    fn from_extract(err: &ExtractError) -> Self {
        let (stage, kind) = match err {
            ExtractError::SchemaNotFound(_) => (ReportStage::Prompted, FailureKind::SchemaNotFound),
            ExtractError::EndpointUnreachable(_) | ExtractError::Client(_) => {
                (ReportStage::Invoked, FailureKind::EndpointUnreachable)
            }
            ExtractError::InvocationTimeout(_) => (ReportStage::Invoked, FailureKind::InvocationTimeout),
            ExtractError::ServerError { .. } => (ReportStage::Invoked, FailureKind::ServerError),
            ExtractError::MalformedReply(_) => (ReportStage::Parsed, FailureKind::MalformedReply),
            ExtractError::SchemaMismatch(_) => (ReportStage::Parsed, FailureKind::SchemaMismatch),
        };
        Self::new(stage, kind, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    Persisted {
        path: PathBuf,
        eligible: bool,
        cancer_category: Option<String>,
        valid: bool,
    },
    Failed(ReportFailure),
}

/// What happened to one report. The record itself lives only on disk.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report_id: String,
    pub status: ReportStatus,
    pub elapsed_seconds: f64,
    pub invocations: Vec<InvocationTiming>,
}

impl ReportOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self.status, ReportStatus::Persisted { .. })
    }

    pub fn failure(&self) -> Option<&ReportFailure> {
        match &self.status {
            ReportStatus::Failed(failure) => Some(failure),
            ReportStatus::Persisted { .. } => None,
        }
    }

    fn timing_row(&self) -> TimingRow {
        let (status, cancer_category) = match &self.status {
            ReportStatus::Persisted { cancer_category, .. } => ("persisted", cancer_category.clone()),
            ReportStatus::Failed(_) => ("failed", None),
        };
        TimingRow {
            report_id: self.report_id.clone(),
            status,
            cancer_category,
            elapsed_seconds: self.elapsed_seconds,
            invocations: self.invocations.len(),
        }
    }
}

/// Per-invocation latencies written next to each record.
#[derive(Debug, Serialize)]
struct TimingRecord<'a> {
    report_id: &'a str,
    elapsed_seconds: f64,
    invocations: &'a [InvocationTiming],
}

/// Sequences loading, extraction and persistence for single reports and
/// whole folders. Reports are processed one at a time.
pub struct Driver {
    extractor: Extractor,
    forced: Option<CancerType>,
}

impl Driver {
    pub fn new(extractor: Extractor, forced: Option<CancerType>) -> Self {
        Self { extractor, forced }
    }

    pub fn model_name(&self) -> &str {
        self.extractor.model_name()
    }

    /// Run one in-memory report through extraction and persist the record.
    pub async fn run_report(&self, report: &Report, out: &ExperimentDir) -> ReportOutcome {
        let started = Instant::now();
        info!(report = %report.id, digest = %report.digest, "Processing report");

        if report.is_blank() {
            let failure = ReportFailure::new(ReportStage::Loaded, FailureKind::ReportUnreadable, "report is empty");
            return self.finish(report.id.clone(), Err(failure), Vec::new(), started, out);
        }

        let extraction = self.extractor.extract(report, self.forced).await;
        let status = match extraction.outcome {
            Ok(record) => match out.write_record(&record) {
                Ok(path) => Ok(ReportStatus::Persisted {
                    path,
                    eligible: record.cancer_excision_report,
                    cancer_category: record.cancer_category.clone(),
                    valid: record.valid,
                }),
                Err(e) => Err(ReportFailure::new(
                    ReportStage::Persisted,
                    FailureKind::PersistFailed,
                    format!("{e:#}"),
                )),
            },
            Err(err) => Err(ReportFailure::from_extract(&err)),
        };

        self.finish(report.id.clone(), status, extraction.invocations, started, out)
    }

    /// Load a report file, then run it. Unreadable files become failures.
    pub async fn run_path(&self, path: &Path, out: &ExperimentDir) -> ReportOutcome {
        match FileReader::read_file(path).await {
            Ok(report) => self.run_report(&report, out).await,
            Err(e) => {
                let failure = ReportFailure::new(ReportStage::Loaded, FailureKind::ReportUnreadable, e.to_string());
                self.finish(report_id(path), Err(failure), Vec::new(), Instant::now(), out)
            }
        }
    }

    /// Every `.txt` report in `input`, in file-name order.
    pub async fn run_folder(&self, input: &Path, out: &ExperimentDir) -> Result<Vec<ReportOutcome>> {
        let paths = FileReader::list_reports(input)?;
        info!(input = %input.display(), reports = paths.len(), "Starting batch");
        self.run_paths(&paths, out).await
    }

    /// `count` reports drawn at random from `input`.
    pub async fn run_sample(
        &self,
        input: &Path,
        count: usize,
        seed: Option<u64>,
        out: &ExperimentDir,
    ) -> Result<Vec<ReportOutcome>> {
        let paths = FileReader::list_reports(input)?;
        let chosen = pick_sample(&paths, count, seed);
        info!(input = %input.display(), available = paths.len(), chosen = chosen.len(), "Starting random sample");
        self.run_paths(&chosen, out).await
    }

    /// Run several input folders. With more than one, each folder's outputs go
    /// to a numbered subfolder. A folder that cannot be listed is skipped.
    pub async fn run_batch(&self, inputs: &[PathBuf], out: &ExperimentDir) -> Result<Vec<ReportOutcome>> {
        if let [input] = inputs {
            return self.run_folder(input, out).await;
        }

        let mut outcomes = Vec::new();
        for (index, input) in inputs.iter().enumerate() {
            let sub = out.subfolder(&(index + 1).to_string())?;
            match self.run_folder(input, &sub).await {
                Ok(folder) => outcomes.extend(folder),
                Err(e) => error!(input = %input.display(), error = %format!("{e:#}"), "Skipping input folder"),
            }
        }
        Ok(outcomes)
    }

    async fn run_paths(&self, paths: &[PathBuf], out: &ExperimentDir) -> Result<Vec<ReportOutcome>> {
        let timing = TimingLog::create(out)?;
        let mut outcomes = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            info!(progress = %format!("{}/{}", index + 1, paths.len()), file = %path.display(), "Next report");
            let outcome = self.run_path(path, out).await;
            if let Err(e) = timing.append(&outcome.timing_row()) {
                warn!(report = %outcome.report_id, error = %e, "Failed to append timing row");
            }
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_persisted()).count();
        info!(persisted = outcomes.len() - failed, failed, "Batch finished");
        Ok(outcomes)
    }

    fn finish(
        &self,
        report_id: String,
        status: Result<ReportStatus, ReportFailure>,
        invocations: Vec<InvocationTiming>,
        started: Instant,
        out: &ExperimentDir,
    ) -> ReportOutcome {
        let elapsed_seconds = started.elapsed().as_secs_f64();

        let timing = TimingRecord {
            report_id: &report_id,
            elapsed_seconds,
            invocations: &invocations,
        };
        if let Err(e) = out.write_timing_record(&report_id, &timing) {
            warn!(report = %report_id, error = %format!("{e:#}"), "Failed to write timing record");
        }

        let status = match status {
            Ok(status) => {
                if let ReportStatus::Persisted { path, .. } = &status {
                    info!(report = %report_id, path = %path.display(), elapsed_seconds, "Record persisted");
                }
                status
            }
            Err(failure) => {
                error!(
                    report = %report_id,
                    stage = failure.stage.as_str(),
                    kind = failure.kind.as_str(),
                    message = %failure.message,
                    "Report failed"
                );
                ReportStatus::Failed(failure)
            }
        };

        ReportOutcome {
            report_id,
            status,
            elapsed_seconds,
            invocations,
        }
    }
}

/// Random subset of `paths`; a seed makes the draw reproducible.
pub fn pick_sample(paths: &[PathBuf], count: usize, seed: Option<u64>) -> Vec<PathBuf> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    paths.choose_multiple(&mut rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_extract_errors_map_to_failure_kinds() {
        let cases = [
            (ExtractError::SchemaNotFound("kidney".into()), ReportStage::Prompted, FailureKind::SchemaNotFound),
            (ExtractError::EndpointUnreachable("x".into()), ReportStage::Invoked, FailureKind::EndpointUnreachable),
            (ExtractError::InvocationTimeout(Duration::from_secs(600)), ReportStage::Invoked, FailureKind::InvocationTimeout),
            (
                ExtractError::ServerError { status: 500, body: String::new() },
                ReportStage::Invoked,
                FailureKind::ServerError,
            ),
            (ExtractError::MalformedReply("x".into()), ReportStage::Parsed, FailureKind::MalformedReply),
            (ExtractError::SchemaMismatch("x".into()), ReportStage::Parsed, FailureKind::SchemaMismatch),
        ];

        for (err, stage, kind) in cases {
            let failure = ReportFailure::from_extract(&err);
            assert_eq!((failure.stage, failure.kind), (stage, kind), "{err}");
        }
    }

    #[test]
    fn test_failure_kind_serialises_snake_case() {
        let json = serde_json::to_string(&FailureKind::EndpointUnreachable).unwrap();
        assert_eq!(json, "\"endpoint_unreachable\"");
        assert_eq!(FailureKind::EndpointUnreachable.as_str(), "endpoint_unreachable");
    }

    #[test]
    fn test_seeded_sample_is_reproducible_and_bounded() {
        let paths: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("r{i:02}.txt"))).collect();

        let first = pick_sample(&paths, 5, Some(7));
        let second = pick_sample(&paths, 5, Some(7));
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);

        assert_eq!(pick_sample(&paths, 50, None).len(), 20);
    }
}
