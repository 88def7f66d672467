use anyhow::{Context, Result};
use chrono::Local;
use extract::StructuredRecord;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TIMING_HEADER: &str = "report_id,status,cancer_category,elapsed_seconds,invocations";

/// One run's output folder, `experiment_<YYYYmmdd_HHMMSS>`.
#[derive(Debug, Clone)]
pub struct ExperimentDir {
    root: PathBuf,
}

impl ExperimentDir {
    /// Create a fresh timestamped folder under `output_root`. A numeric suffix
    /// is added if two runs start within the same second.
    pub fn create(output_root: &Path) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut root = output_root.join(format!("experiment_{stamp}"));
        let mut suffix = 1;
        while root.exists() {
            root = output_root.join(format!("experiment_{stamp}_{suffix}"));
            suffix += 1;
        }
        Self::at(root)
    }

    /// Use (and create if needed) an explicit folder.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create output folder {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn subfolder(&self, name: &str) -> Result<Self> {
        Self::at(self.root.join(name))
    }

    pub fn log_path(&self) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "experiment".to_string());
        self.root.join(format!("{name}.log"))
    }

    /// `<id>_<suffix>` inside this folder. Separators and `..` in the id are
    /// replaced so a label can never point outside the run folder.
    pub fn report_file(&self, report_id: &str, suffix: &str) -> PathBuf {
        self.root.join(format!("{}_{suffix}", file_stem(report_id)))
    }

    pub fn record_path(&self, report_id: &str) -> PathBuf {
        self.report_file(report_id, "output.json")
    }

    pub fn write_timing_record<T: serde::Serialize>(&self, report_id: &str, value: &T) -> Result<PathBuf> {
        let path = self.report_file(report_id, "timing.json");
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_record(&self, record: &StructuredRecord) -> Result<PathBuf> {
        let path = self.record_path(&record.report_id);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Record written");
        Ok(path)
    }

    pub fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.root.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// One row of `timing.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    pub report_id: String,
    pub status: &'static str,
    pub cancer_category: Option<String>,
    pub elapsed_seconds: f64,
    pub invocations: usize,
}

/// Append-only timing table, flushed after every row so an interrupted
/// batch keeps what it measured.
pub struct TimingLog {
    path: PathBuf,
}

impl TimingLog {
    pub fn create(dir: &ExperimentDir) -> Result<Self> {
        let path = dir.path().join("timing.csv");
        if !path.exists() {
            let mut file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            writeln!(file, "{TIMING_HEADER}")?;
        }
        Ok(Self { path })
    }

    pub fn append(&self, row: &TimingRow) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        writeln!(
            file,
            "{},{},{},{:.3},{}",
            csv_field(&row.report_id),
            row.status,
            csv_field(row.cancer_category.as_deref().unwrap_or("")),
            row.elapsed_seconds,
            row.invocations
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn file_stem(report_id: &str) -> String {
    let stem = report_id
        .trim()
        .replace(['/', '\\', ':', '\0'], "_")
        .replace("..", "__");
    if stem.is_empty() { "report".to_string() } else { stem }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_experiment_folder_is_timestamped_and_unique() {
        let root = tempdir().unwrap();

        let first = ExperimentDir::create(root.path()).unwrap();
        let second = ExperimentDir::create(root.path()).unwrap();

        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("experiment_"));
        assert_ne!(first.path(), second.path());
        assert!(first.log_path().ends_with(format!("{name}.log")));
    }

    #[test]
    fn test_timing_rows_appended_under_header() {
        let root = tempdir().unwrap();
        let dir = ExperimentDir::at(root.path()).unwrap();
        let timing = TimingLog::create(&dir).unwrap();

        timing
            .append(&TimingRow {
                report_id: "S24-001".to_string(),
                status: "persisted",
                cancer_category: Some("lung".to_string()),
                elapsed_seconds: 12.3456,
                invocations: 8,
            })
            .unwrap();
        timing
            .append(&TimingRow {
                report_id: "odd, name".to_string(),
                status: "failed",
                cancer_category: None,
                elapsed_seconds: 0.5,
                invocations: 0,
            })
            .unwrap();

        let text = fs::read_to_string(timing.path()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], TIMING_HEADER);
        assert_eq!(lines[1], "S24-001,persisted,lung,12.346,8");
        assert_eq!(lines[2], "\"odd, name\",failed,,0.500,0");
    }

    #[test]
    fn test_record_written_as_pretty_json() {
        let root = tempdir().unwrap();
        let dir = ExperimentDir::at(root.path()).unwrap();

        let path = dir.write_record(&StructuredRecord::not_eligible("S24-009")).unwrap();

        assert!(path.ends_with("S24-009_output.json"));
        let back: StructuredRecord = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(!back.cancer_excision_report);
    }

    #[test]
    fn test_report_files_stay_inside_folder() {
        let root = tempdir().unwrap();
        let dir = ExperimentDir::at(root.path().join("experiment_x")).unwrap();

        for id in ["../escaped", "..\\escaped", "/etc/passwd", "a/../../b", ".."] {
            let path = dir.record_path(id);
            assert_eq!(path.parent(), Some(dir.path()), "{id}");
            assert!(!path.to_string_lossy().contains(".."), "{id}");
        }
        assert!(dir.record_path("S24-001").ends_with("S24-001_output.json"));
        assert!(dir.record_path("  ").ends_with("report_output.json"));

        let path = dir.write_timing_record("../escaped", &serde_json::json!({})).unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(!root.path().join("escaped_timing.json").exists());
    }
}
