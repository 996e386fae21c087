//! JSON file persistence for layout snapshots.
//!
//! The file holds one [`LayoutSnapshot`] serialized with `serde_json` in its
//! camelCase wire form:
//!
//! ```json
//! {
//!   "devices": [ { "id": "...", "modelKey": "FIREWALL", "startUnit": 1, "ports": [] } ],
//!   "connections": [ { "id": "...", "endpointA": { "deviceId": "...", "portIndex": 1 },
//!                      "endpointB": { "deviceId": "...", "portIndex": 2 }, "color": "#38bdf8" } ]
//! }
//! ```
//!
//! Writes go to a sibling temp file that is then renamed over the target, so a
//! crash mid-write never leaves a truncated layout behind.

use std::path::{Path, PathBuf};

use rack_core::LayoutSnapshot;
use tracing::debug;

use crate::application::repository::{LayoutRepository, StorageError};

/// A [`LayoutRepository`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonLayoutFile {
    path: PathBuf,
}

impl JsonLayoutFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "layout.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LayoutRepository for JsonLayoutFile {
    fn load(&self) -> Result<Option<LayoutSnapshot>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no layout file yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let snapshot = serde_json::from_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &LayoutSnapshot) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(snapshot).map_err(StorageError::Serialize)?;
        let temp = self.temp_path();
        std::fs::write(&temp, content).map_err(|source| StorageError::Io {
            path: temp.clone(),
            source,
        })?;
        std::fs::rename(&temp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            path = %self.path.display(),
            devices = snapshot.devices.len(),
            connections = snapshot.connections.len(),
            "layout saved"
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
