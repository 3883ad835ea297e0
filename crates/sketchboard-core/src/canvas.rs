//! Canvas state: the ordered sequence of committed shapes.

use crate::history::Snapshot;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::HashSet;
use std::sync::Arc;

/// The shapes currently on the surface, back to front.
///
/// Storage is a shared [`Snapshot`]. Every mutation goes through
/// [`Arc::make_mut`], so a sequence that history still references is cloned
/// before it is touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    shapes: Snapshot,
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a canvas from loaded shapes.
    ///
    /// Shapes whose id repeats an earlier one get a fresh id so that every
    /// shape stays individually addressable.
    pub fn from_shapes(mut shapes: Vec<Shape>) -> Self {
        let mut seen = HashSet::with_capacity(shapes.len());
        for shape in &mut shapes {
            if !seen.insert(shape.id()) {
                let old = shape.id();
                shape.regenerate_id();
                log::warn!("Duplicate shape id {} replaced with {}", old, shape.id());
                seen.insert(shape.id());
            }
        }
        Self {
            shapes: Arc::new(shapes),
        }
    }

    /// Share the current state without copying.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.shapes)
    }

    /// Replace the whole state with a recorded snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.shapes = snapshot;
    }

    /// Whether the canvas currently shares storage with `snapshot`.
    pub fn is_same(&self, snapshot: &Snapshot) -> bool {
        Arc::ptr_eq(&self.shapes, snapshot)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    /// Find the index of a shape by id.
    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|shape| shape.id() == id)
    }

    /// Append a shape on top. Returns its index.
    pub fn push(&mut self, shape: Shape) -> usize {
        let shapes = Arc::make_mut(&mut self.shapes);
        shapes.push(shape);
        shapes.len() - 1
    }

    /// Replace the shape at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, shape: Shape) -> Option<Shape> {
        if index >= self.shapes.len() {
            return None;
        }
        let slot = &mut Arc::make_mut(&mut self.shapes)[index];
        Some(std::mem::replace(slot, shape))
    }

    /// Mutable access to one shape. Clones the sequence if it is shared.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Shape> {
        if index >= self.shapes.len() {
            return None;
        }
        Arc::make_mut(&mut self.shapes).get_mut(index)
    }

    /// Remove the shape at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Shape> {
        if index >= self.shapes.len() {
            return None;
        }
        Some(Arc::make_mut(&mut self.shapes).remove(index))
    }

    /// Topmost shape under `point`, as an index.
    pub fn shape_at(&self, point: Point, tolerance: f64) -> Option<usize> {
        self.shapes
            .iter()
            .rposition(|shape| shape.hit_test(point, tolerance))
    }

    /// Union of all shape bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Rectangle, SerializableColor};

    fn rect_at(x: f64) -> Shape {
        Shape::Rect(Rectangle::new(Point::new(x, 0.0), 10.0, 10.0))
    }

    #[test]
    fn test_push_and_get() {
        let mut canvas = Canvas::new();
        assert!(canvas.is_empty());
        let index = canvas.push(rect_at(0.0));
        assert_eq!(index, 0);
        assert_eq!(canvas.len(), 1);
        assert_eq!(canvas.index_of(canvas.shapes()[0].id()), Some(0));
    }

    #[test]
    fn test_mutation_copies_shared_snapshot() {
        let mut canvas = Canvas::new();
        canvas.push(rect_at(0.0));
        let recorded = canvas.snapshot();
        assert!(canvas.is_same(&recorded));

        canvas.get_mut(0).unwrap().style_mut().color = SerializableColor::rgb(0, 255, 0);

        assert!(!canvas.is_same(&recorded));
        assert_eq!(recorded[0].style().color, SerializableColor::black());
        assert_eq!(canvas.shapes()[0].style().color, SerializableColor::rgb(0, 255, 0));
    }

    #[test]
    fn test_replace_and_remove_out_of_range() {
        let mut canvas = Canvas::new();
        assert!(canvas.replace(0, rect_at(0.0)).is_none());
        assert!(canvas.remove(3).is_none());
        assert!(canvas.get_mut(0).is_none());
    }

    #[test]
    fn test_shape_at_prefers_topmost() {
        let mut canvas = Canvas::new();
        canvas.push(Shape::Circle(Circle::new(Point::new(10.0, 10.0), 10.0)));
        canvas.push(rect_at(0.0));
        // (0,10) is on the circle ring and on the rect's left edge.
        assert_eq!(canvas.shape_at(Point::new(0.0, 10.0), 1.0), Some(1));
        assert_eq!(canvas.shape_at(Point::new(200.0, 200.0), 1.0), None);
    }

    #[test]
    fn test_from_shapes_dedupes_ids() {
        let shape = rect_at(0.0);
        let canvas = Canvas::from_shapes(vec![shape.clone(), shape.clone()]);
        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.shapes()[0].id(), shape.id());
        assert_ne!(canvas.shapes()[1].id(), shape.id());
    }

    #[test]
    fn test_bounds() {
        let mut canvas = Canvas::new();
        assert!(canvas.bounds().is_none());
        canvas.push(rect_at(0.0));
        canvas.push(rect_at(50.0));
        assert_eq!(canvas.bounds(), Some(Rect::new(0.0, 0.0, 60.0, 10.0)));
    }
}
