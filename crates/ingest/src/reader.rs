use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::{IngestError, Report};

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<Report, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        if extension != "txt" {
            return Err(IngestError::UnsupportedFormat(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Report::new(report_id(path), text, Some(path.to_path_buf())))
    }

    /// List the `.txt` files directly inside `dir`, sorted by file name.
    pub fn list_reports(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        if !dir.is_dir() {
            return Err(IngestError::NotADirectory(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| IngestError::Walk {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;

            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                files.push(path.to_path_buf());
            }
        }

        debug!(dir = %dir.display(), count = files.len(), "Listed report files");
        Ok(files)
    }
}

/// Report identifier: the file stem, falling back to the full file name.
pub fn report_id(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
