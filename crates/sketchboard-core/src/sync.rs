//! Project load/save against a [`ProjectStore`].
//!
//! Failures never reach the interaction engine as errors. They are logged
//! here and turned into a [`Notice`] the UI can show; the in-memory canvas
//! stays as it was.

use crate::history::Snapshot;
use crate::shapes::Shape;
use crate::storage::{ProjectStore, StorageError, StorageResult};
use std::fmt;

/// A non-fatal message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a sync round trip, ready to hand to the engine.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Shapes read from the store. Empty for a project that does not exist yet.
    Loaded(Vec<Shape>),
    /// The store now holds this snapshot.
    Saved(Snapshot),
    Failed(Notice),
}

impl SyncOutcome {
    /// Interpret a raw load result. An unknown project is an empty canvas.
    pub fn from_load(project_id: &str, result: StorageResult<Vec<Shape>>) -> Self {
        match result {
            Ok(shapes) => {
                log::info!("Loaded {} shapes for project {}", shapes.len(), project_id);
                SyncOutcome::Loaded(shapes)
            }
            Err(StorageError::NotFound(_)) => {
                log::info!("Project {} not found, starting empty", project_id);
                SyncOutcome::Loaded(Vec::new())
            }
            Err(e) => {
                log::warn!("Failed to load project {}: {}", project_id, e);
                SyncOutcome::Failed(Notice::new(format!("Could not load project: {}", e)))
            }
        }
    }

    /// Interpret a raw save result for `snapshot`.
    pub fn from_save(project_id: &str, snapshot: Snapshot, result: StorageResult<()>) -> Self {
        match result {
            Ok(()) => {
                log::info!("Saved {} shapes for project {}", snapshot.len(), project_id);
                SyncOutcome::Saved(snapshot)
            }
            Err(e) => {
                log::warn!("Failed to save project {}: {}", project_id, e);
                SyncOutcome::Failed(Notice::new(format!("Could not save project: {}", e)))
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// A store bound to one project.
pub struct ProjectSync<S> {
    store: S,
    project_id: String,
}

impl<S: ProjectStore> ProjectSync<S> {
    pub fn new(store: S, project_id: impl Into<String>) -> Self {
        Self {
            store,
            project_id: project_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the project's shapes.
    pub async fn load(&self) -> SyncOutcome {
        let result = self.store.load(&self.project_id).await;
        SyncOutcome::from_load(&self.project_id, result)
    }

    /// Replace the project's shapes with `snapshot`.
    ///
    /// The snapshot is shared, so the engine can keep editing while the
    /// request is in flight.
    pub async fn save(&self, snapshot: Snapshot) -> SyncOutcome {
        let result = self.store.save(&self.project_id, &snapshot).await;
        SyncOutcome::from_save(&self.project_id, snapshot, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Rectangle};
    use crate::storage::{BoxFuture, MemoryStore};
    use kurbo::Point;
    use pollster::block_on;
    use std::sync::Arc;

    struct FailingStore;

    impl ProjectStore for FailingStore {
        fn load(&self, _project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>> {
            Box::pin(async { Err(StorageError::Transport("connection refused".to_string())) })
        }

        fn save(&self, _project_id: &str, _shapes: &[Shape]) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            })
        }

        fn delete(&self, _project_id: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Transport("connection refused".to_string())) })
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Err(StorageError::Transport("connection refused".to_string())) })
        }
    }

    #[test]
    fn test_unknown_project_loads_empty() {
        let sync = ProjectSync::new(MemoryStore::new(), "fresh");
        match block_on(sync.load()) {
            SyncOutcome::Loaded(shapes) => assert!(shapes.is_empty()),
            other => panic!("expected empty load, got {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let sync = ProjectSync::new(MemoryStore::new(), "p");
        let snapshot: Snapshot = Arc::new(vec![
            Shape::Rect(Rectangle::new(Point::ZERO, 4.0, 4.0)),
            Shape::Circle(Circle::new(Point::new(2.0, 2.0), 1.0)),
        ]);

        match block_on(sync.save(Arc::clone(&snapshot))) {
            SyncOutcome::Saved(saved) => assert!(Arc::ptr_eq(&saved, &snapshot)),
            other => panic!("expected save, got {other:?}"),
        }
        match block_on(sync.load()) {
            SyncOutcome::Loaded(shapes) => assert_eq!(&shapes, snapshot.as_ref()),
            other => panic!("expected load, got {other:?}"),
        }
    }

    #[test]
    fn test_failures_become_notices() {
        let sync = ProjectSync::new(FailingStore, "p");

        let load = block_on(sync.load());
        assert!(load.is_failure());
        if let SyncOutcome::Failed(notice) = load {
            assert!(notice.message.contains("connection refused"));
        }

        let save = block_on(sync.save(Arc::new(Vec::new())));
        assert!(save.is_failure());
    }
}
