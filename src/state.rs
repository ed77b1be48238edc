//! Download-progress persistence for resume support.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The set of item ids whose bytes are already in the archive.
///
/// Persisted as `{"downloaded": [id, ...]}`. Loaded at startup, append-only
/// within a run, and re-written after every successful archive append so an
/// interrupted process loses at most the one in-flight item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadState {
    #[serde(default)]
    downloaded: HashSet<String>,
}

impl DownloadState {
    /// Loads the state from disk; an absent file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Saves the state atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Whether an item has already been archived.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.downloaded.contains(id)
    }

    /// Records a completed item and immediately persists the whole set.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn mark_downloaded(&mut self, id: impl Into<String>, path: &Path) -> std::io::Result<()> {
        self.downloaded.insert(id.into());
        self.save(path)
    }

    /// Number of archived items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.downloaded.len()
    }

    /// Whether nothing has been archived yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.downloaded.is_empty()
    }
}
