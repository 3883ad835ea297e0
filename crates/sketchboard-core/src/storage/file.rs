//! File-based storage implementation.

use super::{BoxFuture, ProjectStore, StorageError, StorageResult, decode_records, encode_records};
use crate::shapes::Shape;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each project as a JSON file of records in a directory.
pub struct FileStore {
    /// Base directory for project files.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/sketchboard/projects/`
    /// On Windows: `%LOCALAPPDATA%\sketchboard\projects\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("sketchboard").join("projects"))
    }

    /// Get the file path for a project id.
    fn project_path(&self, project_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_file_stem(project_id)))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl ProjectStore for FileStore {
    fn load(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>> {
        let path = self.project_path(project_id);
        let project_id = project_id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(project_id));
            }

            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            decode_records(&json)
        })
    }

    fn save(&self, project_id: &str, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(project_id);
        let json = encode_records(shapes);

        Box::pin(async move {
            let json = json?;
            // Write then rename so a crash never leaves a truncated project
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, project_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(project_id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };
                match decode_file_stem(stem) {
                    Some(id) => ids.push(id),
                    None => log::warn!("Skipping foreign file {}", path.display()),
                }
            }
            ids.sort();
            Ok(ids)
        })
    }
}

/// Escape a project id into a file stem.
///
/// ASCII letters, digits and `-` pass through. Every other byte, `_`
/// included, becomes `_XX` (uppercase hex), so distinct ids never share a
/// file and no id can leave the base directory.
fn encode_file_stem(project_id: &str) -> String {
    let mut stem = String::with_capacity(project_id.len());
    for byte in project_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

/// Inverse of [`encode_file_stem`]. `None` for stems it could not have produced.
fn decode_file_stem(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        if first == b'_' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            let byte = u8::from_str_radix(hex, 16).ok()?;
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                return None;
            }
            bytes.push(byte);
            rest = &tail[2..];
        } else if first.is_ascii_alphanumeric() || first == b'-' {
            bytes.push(first);
            rest = tail;
        } else {
            return None;
        }
    }
    String::from_utf8(bytes).ok()
}
