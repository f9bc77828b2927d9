//! One JSON file per drawing, for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::canvas::CanvasDocument;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Drawings as `<dir>/<name>.json`, each holding a JSON array of shape records.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStorage {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir })
    }

    /// `inkpad/drawings` under the platform's local data directory
    /// (`~/.local/share` on Linux, `%LOCALAPPDATA%` on Windows).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir().ok_or(StorageError::NoDataDir)?;
        Self::new(base.join("inkpad").join("drawings"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a drawing name. Anything but letters, digits, `-` and `_`
    /// becomes `_` so names cannot escape the directory.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let file_stem: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(file_stem).with_extension("json")
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &CanvasDocument) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(id);
        let encoded = document.to_json().map_err(|source| StorageError::Encode {
            id: id.to_string(),
            source,
        });
        Box::pin(async move {
            let json = encoded?;
            fs::write(&path, json).map_err(io_error(&path))?;
            log::debug!("Wrote {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasDocument>> {
        let path = self.path_for(id);
        let id = id.to_string();
        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StorageError::NotFound(id)),
                Err(e) => return Err(io_error(&path)(e)),
            };
            CanvasDocument::from_json(&json).map_err(|source| StorageError::Malformed { id, source })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(id);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_error(&path)(e)),
                _ => Ok(()),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.dir).map_err(io_error(&self.dir))?;
            let mut ids: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.path_for(id);
        Box::pin(async move { Ok(path.is_file()) })
    }
}
