//! Sketchboard Core Library
//!
//! Shape-editing engine for the Sketchboard drawing surface: the shape model,
//! the tool-driven interaction state machine, undo history, selection
//! handles, and the boundary adapters for export, image import and project
//! persistence. Rendering is left to the host.

pub mod canvas;
pub mod config;
pub mod engine;
pub mod export;
pub mod history;
pub mod import;
pub mod input;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod sync;
pub mod tools;

pub use canvas::Canvas;
pub use config::{ConfigError, EngineConfig, StoreConfig};
pub use engine::{Engine, Interaction};
pub use export::{ExportError, PageSize, Raster, Rasterizer, export_pdf, export_png};
pub use history::{History, Snapshot};
pub use import::{ImportError, decode_image};
pub use input::{ClickTracker, InputEvent};
pub use selection::{Corner, Handle, HandleKind, Manipulation, Selection};
pub use shapes::{SerializableColor, Shape, ShapeId, ShapeStyle};
pub use storage::{FileStore, MemoryStore, ProjectStore, ShapeRecord, StorageError, StorageResult};
#[cfg(feature = "http")]
pub use storage::HttpStore;
pub use sync::{Notice, ProjectSync, SyncOutcome};
pub use tools::ToolKind;
