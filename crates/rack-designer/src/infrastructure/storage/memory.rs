//! In-process layout repository.

use std::sync::Mutex;

use rack_core::LayoutSnapshot;

use crate::application::repository::{LayoutRepository, StorageError};

/// A [`LayoutRepository`] that keeps the last saved snapshot in memory.
///
/// Used for ephemeral sessions and as a test double for the command bridge.
#[derive(Debug, Default)]
pub struct InMemoryLayoutRepository {
    stored: Mutex<Option<LayoutSnapshot>>,
    saves: Mutex<usize>,
}

impl InMemoryLayoutRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that already holds `snapshot`.
    pub fn with_snapshot(snapshot: LayoutSnapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    /// The last saved snapshot, if any.
    pub fn stored(&self) -> Option<LayoutSnapshot> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self
            .saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LayoutRepository for InMemoryLayoutRepository {
    fn load(&self) -> Result<Option<LayoutSnapshot>, StorageError> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &LayoutSnapshot) -> Result<(), StorageError> {
        *self
            .stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(snapshot.clone());
        *self
            .saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Ok(())
    }
}
