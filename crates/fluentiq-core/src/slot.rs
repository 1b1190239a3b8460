use crate::error::Result;
use std::path::{Path, PathBuf};

/// Key of the slot holding the most recent single-analysis result.
pub const LAST_RESULT_KEY: &str = "fluentiq_last_result";

/// Client-local key-value slot for the most recent analysis result.
///
/// Holds the raw JSON exactly as received so the results view can decode it
/// later. Nothing else in the crate manages its lifetime.
#[derive(Debug, Clone)]
pub struct LastResultSlot {
    path: PathBuf,
}

impl LastResultSlot {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{LAST_RESULT_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, raw: &serde_json::Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(raw)?)?;
        tracing::debug!("Stored last result at {:?}", self.path);
        Ok(())
    }

    /// Read the slot. `None` when nothing has been stored yet.
    pub fn load(&self) -> Result<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
