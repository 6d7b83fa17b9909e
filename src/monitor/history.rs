//! Previous snapshot, persisted as a pretty-printed JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use super::snapshot::Snapshot;
use crate::error::Result;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot. A missing or corrupt file yields an empty one.
    pub fn load(&self) -> Snapshot {
        if !self.path.exists() {
            log::info!("No history at {}, starting fresh", self.path.display());
            return Snapshot::new();
        }

        match self.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Failed to read history {}: {}", self.path.display(), e);
                Snapshot::new()
            }
        }
    }

    fn read(&self) -> Result<Snapshot> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrite the history with `snapshot`
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(snapshot)?;

        // Temp file + rename so a failed write never truncates the old history
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        log::info!("Saved snapshot of {} symbols to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}
