//! Project persistence.
//!
//! A project's canvas is stored as a flat, ordered list of `{ "value": shape }`
//! records. Loads read the whole list and saves replace it; there is no
//! incremental update and no version field. Stores also enumerate and delete
//! whole projects for the project dashboard.

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use file::FileStore;
#[cfg(feature = "http")]
pub use http::HttpStore;
pub use memory::MemoryStore;

use crate::shapes::Shape;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Remote store returned status {status}")]
    Http { status: u16, body: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Envelope around each stored shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub value: Shape,
}

/// Wrap shapes into records, preserving order.
fn to_records(shapes: &[Shape]) -> Vec<ShapeRecord> {
    shapes
        .iter()
        .cloned()
        .map(|value| ShapeRecord { value })
        .collect()
}

/// Unwrap records into shapes, preserving order.
fn from_records(records: Vec<ShapeRecord>) -> Vec<Shape> {
    records.into_iter().map(|record| record.value).collect()
}

/// Serialize shapes as a JSON array of records.
pub fn encode_records(shapes: &[Shape]) -> StorageResult<String> {
    serde_json::to_string(&to_records(shapes))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a JSON array of records. Any malformed record fails the whole list.
pub fn decode_records(json: &str) -> StorageResult<Vec<Shape>> {
    let records: Vec<ShapeRecord> =
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(from_records(records))
}

/// A backend holding project canvases by project id.
pub trait ProjectStore: Send + Sync {
    /// Read every shape of a project, in order.
    fn load(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>>;

    /// Replace a project's shapes.
    fn save(&self, project_id: &str, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a project. Deleting an unknown project succeeds.
    fn delete(&self, project_id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all project ids, sorted.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}
