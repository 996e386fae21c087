//! Persistence port for layout snapshots.

use std::path::PathBuf;

use rack_core::LayoutSnapshot;
use thiserror::Error;

/// Error type for layout persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing layout at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored layout is not valid JSON for a snapshot.
    #[error("failed to parse layout JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be serialized.
    #[error("failed to serialize layout: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Loads and saves whole-layout snapshots.
///
/// Implementations are synchronous; a snapshot is at most a few dozen
/// devices.
#[cfg_attr(test, mockall::automock)]
pub trait LayoutRepository: Send + Sync {
    /// Returns the stored snapshot, or `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store exists but cannot be read or
    /// parsed.
    fn load(&self) -> Result<Option<LayoutSnapshot>, StorageError>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the snapshot cannot be written.
    fn save(&self, snapshot: &LayoutSnapshot) -> Result<(), StorageError>;
}
