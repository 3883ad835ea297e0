//! In-memory storage implementation.

use super::{BoxFuture, ProjectStore, StorageError, StorageResult};
use crate::shapes::Shape;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<String, Vec<Shape>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects.
    pub fn project_count(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects
                .get(&project_id)
                .cloned()
                .ok_or(StorageError::NotFound(project_id))
        })
    }

    fn save(&self, project_id: &str, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        let shapes = shapes.to_vec();
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects.insert(project_id, shapes);
            Ok(())
        })
    }

    fn delete(&self, project_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            projects.remove(&project_id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            let mut ids: Vec<String> = projects.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;
    use kurbo::Point;
    use pollster::block_on;

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let shapes = vec![Shape::Rect(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0))];

        block_on(store.save("p1", &shapes)).unwrap();
        let loaded = block_on(store.load("p1")).unwrap();

        assert_eq!(loaded, shapes);
        assert_eq!(store.project_count(), 1);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_save_replaces() {
        let store = MemoryStore::new();
        let rect = Shape::Rect(Rectangle::new(Point::ZERO, 1.0, 1.0));

        block_on(store.save("p", &[rect.clone(), rect.clone()])).unwrap();
        block_on(store.save("p", &[rect])).unwrap();

        assert_eq!(block_on(store.load("p")).unwrap().len(), 1);
    }

    #[test]
    fn test_list_and_delete() {
        let store = MemoryStore::new();
        for id in ["zeta", "alpha", "mid"] {
            block_on(store.save(id, &[])).unwrap();
        }
        assert_eq!(block_on(store.list()).unwrap(), vec!["alpha", "mid", "zeta"]);

        block_on(store.delete("mid")).unwrap();
        block_on(store.delete("never-saved")).unwrap();

        assert_eq!(block_on(store.list()).unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(store.project_count(), 2);
        assert!(matches!(block_on(store.load("mid")), Err(StorageError::NotFound(_))));
    }
}
