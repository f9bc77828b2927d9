//! Saving the shape list after commits.
//!
//! The host asks [`AutoSaveManager::take_due`] after handling input (typically
//! when an [`Outcome`](crate::canvas::Outcome) reports a commit) and awaits
//! [`AutoSaveManager::save`] with the copy it hands back. The canvas itself is
//! never borrowed across the await.

use crate::canvas::{Canvas, CanvasDocument};
use crate::storage::{Storage, StorageResult};
use crate::surface::Surface;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Minimum seconds between saves. Zero saves after every commit.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 0;

/// Name used when the host did not pick one.
pub const DEFAULT_DOCUMENT_ID: &str = "drawing";

/// Writes a canvas' shape list under one name whenever it changed.
pub struct AutoSaveManager<S: Storage + ?Sized> {
    storage: Arc<S>,
    document_id: String,
    interval: Duration,
    last_save: Option<Instant>,
    /// Changes collected from the canvas that are not stored yet.
    pending: bool,
}

impl<S: Storage + ?Sized> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            document_id: DEFAULT_DOCUMENT_ID.to_string(),
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            pending: false,
        }
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = id.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Collect the canvas' unsaved changes. Returns a copy of its document
    /// when a save is due; changes made too soon after the last save stay
    /// pending until a later call.
    pub fn take_due<T: Surface>(&mut self, canvas: &mut Canvas<T>) -> Option<CanvasDocument> {
        self.pending |= canvas.take_dirty();
        if !self.pending {
            return None;
        }
        if self.last_save.is_some_and(|last| last.elapsed() < self.interval) {
            return None;
        }
        Some(canvas.document.clone())
    }

    /// Store `document`. Pending changes are cleared only once it is written.
    pub async fn save(&mut self, document: &CanvasDocument) -> StorageResult<()> {
        if let Err(e) = self.storage.save(&self.document_id, document).await {
            log::warn!("Auto-save of '{}' failed: {}", self.document_id, e);
            return Err(e);
        }
        log::debug!("Auto-saved {} shapes as '{}'", document.len(), self.document_id);
        self.last_save = Some(Instant::now());
        self.pending = false;
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::config::PadOptions;
    use crate::geometry::Point;
    use crate::storage::{BoxFuture, MemoryStorage, StorageError, block_on};
    use crate::surface::RecordingSurface;

    /// Backend that refuses every write.
    struct ReadOnly;

    impl Storage for ReadOnly {
        fn save(&self, id: &str, _document: &CanvasDocument) -> BoxFuture<'_, StorageResult<()>> {
            let id = id.to_string();
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }

        fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasDocument>> {
            let id = id.to_string();
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }

        fn delete(&self, _id: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn exists(&self, _id: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Ok(false) })
        }
    }

    fn canvas() -> Canvas<RecordingSurface> {
        Canvas::new(RecordingSurface::new(100.0, 100.0), PadOptions::default())
    }

    fn stroke(canvas: &mut Canvas<RecordingSurface>, x: f64) {
        canvas.begin_stroke(Point::new(x, 1.0, 0));
        canvas.update_stroke(Point::new(x + 4.0, 5.0, 10));
        canvas.end_stroke();
    }

    #[test]
    fn test_nothing_due_without_changes() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert_eq!(manager.document_id(), DEFAULT_DOCUMENT_ID);
        assert!(manager.take_due(&mut canvas()).is_none());
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_saves_after_stroke() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone()).with_document_id("sketch");
        let mut canvas = canvas();

        stroke(&mut canvas, 1.0);
        let due = manager.take_due(&mut canvas).unwrap();
        assert!(!canvas.is_dirty());
        block_on(manager.save(&due)).unwrap();
        assert!(!manager.has_pending());

        let saved = block_on(storage.load("sketch")).unwrap();
        assert_eq!(saved.shapes(), canvas.shapes());
        assert!(manager.take_due(&mut canvas).is_none());
    }

    #[test]
    fn test_interval_defers_save() {
        let mut manager =
            AutoSaveManager::new(Arc::new(MemoryStorage::new())).with_interval(Duration::from_secs(3600));
        let mut canvas = canvas();

        stroke(&mut canvas, 1.0);
        let due = manager.take_due(&mut canvas).unwrap();
        block_on(manager.save(&due)).unwrap();

        stroke(&mut canvas, 20.0);
        assert!(manager.take_due(&mut canvas).is_none());
        assert!(manager.has_pending());
    }

    #[test]
    fn test_failed_save_stays_pending() {
        let mut manager = AutoSaveManager::new(Arc::new(ReadOnly));
        let mut canvas = canvas();

        stroke(&mut canvas, 1.0);
        let due = manager.take_due(&mut canvas).unwrap();
        assert!(block_on(manager.save(&due)).is_err());
        assert!(manager.has_pending());
        assert!(manager.take_due(&mut canvas).is_some());
    }
}
