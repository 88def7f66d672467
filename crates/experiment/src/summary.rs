use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::driver::{ReportOutcome, ReportStatus};
use crate::output::ExperimentDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub model: String,
    pub started_at: String,
    pub inputs: Vec<String>,
    pub total_reports: usize,
    pub persisted: usize,
    pub failed: usize,
    /// Persisted records with at least one unusable section.
    pub partial: usize,
    pub avg_elapsed_seconds: f64,
    pub p50_elapsed_seconds: f64,
    pub p95_elapsed_seconds: f64,
    pub by_category: Vec<CategoryCount>,
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureEntry {
    pub report_id: String,
    pub stage: String,
    pub kind: String,
    pub message: String,
}

impl RunSummary {
    pub fn from_outcomes(
        model: &str,
        started_at: String,
        inputs: Vec<String>,
        outcomes: &[ReportOutcome],
    ) -> Self {
        let mut latencies: Vec<f64> = outcomes.iter().map(|o| o.elapsed_seconds).collect();
        latencies.sort_by(f64::total_cmp);

        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut failures = Vec::new();
        let mut partial = 0;

        for outcome in outcomes {
            match &outcome.status {
                ReportStatus::Persisted {
                    eligible,
                    cancer_category,
                    valid,
                    ..
                } => {
                    let category = match (eligible, cancer_category) {
                        (false, _) => "not_eligible".to_string(),
                        (true, Some(category)) => category.clone(),
                        (true, None) => "unknown".to_string(),
                    };
                    *categories.entry(category).or_default() += 1;
                    if !valid {
                        partial += 1;
                    }
                }
                ReportStatus::Failed(failure) => failures.push(FailureEntry {
                    report_id: outcome.report_id.clone(),
                    stage: failure.stage.as_str().to_string(),
                    kind: failure.kind.as_str().to_string(),
                    message: failure.message.clone(),
                }),
            }
        }

        let avg = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        Self {
            run_id: Uuid::new_v4(),
            model: model.to_string(),
            started_at,
            inputs,
            total_reports: outcomes.len(),
            persisted: outcomes.len() - failures.len(),
            failed: failures.len(),
            partial,
            avg_elapsed_seconds: avg,
            p50_elapsed_seconds: percentile(&latencies, 50),
            p95_elapsed_seconds: percentile(&latencies, 95),
            by_category: categories
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
            failures,
        }
    }

    pub fn write(&self, dir: &ExperimentDir) -> Result<PathBuf> {
        dir.write_json("summary.json", self)
    }
}

/// Nearest-rank percentile of already sorted data; 0 for no data.
pub fn percentile(sorted: &[f64], p: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (p as f64 / 100.0 * sorted.len() as f64) as usize;
    sorted[index.min(sorted.len() - 1)]
}
