//! Shape lists held in memory as their serialized JSON.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::canvas::CanvasDocument;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Ephemeral storage. Drawings are kept in their JSON form, so a save and load
/// goes through the same encoding as a file would.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    drawings: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON under `id`, e.g. a drawing received from elsewhere.
    pub fn insert_json(&self, id: &str, json: impl Into<String>) -> StorageResult<()> {
        let mut drawings = self.drawings.write().map_err(|_| StorageError::Poisoned)?;
        drawings.insert(id.to_string(), json.into());
        Ok(())
    }

    /// The stored JSON for `id`.
    pub fn json(&self, id: &str) -> StorageResult<Option<String>> {
        let drawings = self.drawings.read().map_err(|_| StorageError::Poisoned)?;
        Ok(drawings.get(id).cloned())
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &CanvasDocument) -> BoxFuture<'_, StorageResult<()>> {
        let result = document
            .to_json()
            .map_err(|source| StorageError::Encode {
                id: id.to_string(),
                source,
            })
            .and_then(|json| self.insert_json(id, json));
        Box::pin(async move { result })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            let json = self.json(&id)?.ok_or_else(|| StorageError::NotFound(id.clone()))?;
            CanvasDocument::from_json(&json).map_err(|source| StorageError::Malformed { id, source })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.drawings
                .write()
                .map_err(|_| StorageError::Poisoned)?
                .remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let drawings = self.drawings.read().map_err(|_| StorageError::Poisoned)?;
            Ok(drawings.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.json(&id)?.is_some()) })
    }
}
