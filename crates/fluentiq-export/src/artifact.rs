use chrono::{DateTime, Utc};
use fluentiq_core::error::Result;
use std::path::{Path, PathBuf};

pub const MIME_CSV: &str = "text/csv;charset=utf-8";
pub const MIME_JSON: &str = "application/json";
pub const MIME_PNG: &str = "image/png";

/// A downloadable export: a suggested filename plus its encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, mime: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime,
            bytes,
        }
    }

    /// Write the artifact into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!("Exported {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Filename timestamp: ISO 8601 in UTC, to the second.
pub fn file_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}
