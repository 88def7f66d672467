use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// One pathology report: raw text plus the identifier it is filed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: String,
    pub text: String,
    pub source: Option<PathBuf>,
    pub digest: String,
}

impl Report {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: Option<PathBuf>) -> Self {
        let text = text.into();
        let digest = Self::generate_digest(&text);

        Self {
            id: id.into(),
            text,
            source,
            digest,
        }
    }

    /// Build a report from caller-supplied text, e.g. a pasted report.
    pub fn from_text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(label, text, None)
    }

    fn generate_digest(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }

    /// Paragraphs separated by blank lines, trimmed, empty ones dropped.
    pub fn paragraphs(&self) -> Vec<String> {
        split_paragraphs(&self.text)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
