pub mod reader;
pub mod report;

pub use reader::{FileReader, report_id};
pub use report::{Report, split_paragraphs};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read report {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported report format: {0:?} (expected .txt)")]
    UnsupportedFormat(PathBuf),

    #[error("Input path is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Failed to list {path:?}: {message}")]
    Walk { path: PathBuf, message: String },
}
