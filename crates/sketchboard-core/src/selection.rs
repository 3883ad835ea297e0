//! Selection and manipulation handle system.

use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance in world units.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Smallest extent a corner resize may produce.
const MIN_EXTENT: f64 = 1.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Endpoint handle for lines/arrows (index 0 = start, 1 = end).
    Endpoint(usize),
    /// Corner handle of the bounding box.
    Corner(Corner),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    /// Handle type.
    pub kind: HandleKind,
}

impl Handle {
    /// Create a new handle.
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance(point) <= tolerance
    }
}

/// Get the selection handles for a shape.
///
/// Text has none: it can only be moved.
pub fn get_handles(shape: &Shape) -> Vec<Handle> {
    match shape {
        Shape::Line(line) => {
            let mut handles = Vec::with_capacity(2);
            if let Some(start) = line.start() {
                handles.push(Handle::new(start, HandleKind::Endpoint(0)));
            }
            if let Some(end) = line.end() {
                handles.push(Handle::new(end, HandleKind::Endpoint(1)));
            }
            handles
        }
        Shape::Rect(_) | Shape::Circle(_) | Shape::Image(_) | Shape::Freehand(_) => {
            corner_handles(shape.bounds())
        }
        Shape::Text(_) => Vec::new(),
    }
}

/// Generate corner handles for a bounding rectangle.
fn corner_handles(bounds: Rect) -> Vec<Handle> {
    [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ]
    .into_iter()
    .map(|corner| Handle::new(corner_position(bounds, corner), HandleKind::Corner(corner)))
    .collect()
}

fn corner_position(bounds: Rect, corner: Corner) -> Point {
    match corner {
        Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
        Corner::TopRight => Point::new(bounds.x1, bounds.y0),
        Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
        Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
    }
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(shape)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// A shape targeted by the selection: its index in the canvas plus its id.
///
/// Both are checked before any mutation so a stale selection never edits
/// the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub id: ShapeId,
}

impl Selection {
    pub fn new(index: usize, id: ShapeId) -> Self {
        Self { index, id }
    }

    /// Whether this selection still names `shapes[index]`.
    pub fn is_valid_for(&self, shapes: &[Shape]) -> bool {
        shapes.get(self.index).is_some_and(|shape| shape.id() == self.id)
    }
}

/// State of an active handle or move drag.
#[derive(Debug, Clone)]
pub struct Manipulation {
    /// The shape being manipulated.
    pub selection: Selection,
    /// The handle being dragged (None = moving the whole shape).
    pub handle: Option<HandleKind>,
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Shape as it was when the drag began.
    pub original_shape: Shape,
}

impl Manipulation {
    /// Create a new manipulation state.
    pub fn new(
        selection: Selection,
        handle: Option<HandleKind>,
        start_point: Point,
        original_shape: Shape,
    ) -> Self {
        Self {
            selection,
            handle,
            start_point,
            current_point: start_point,
            original_shape,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// The original shape with the current delta applied.
    pub fn preview(&self) -> Shape {
        apply_manipulation(&self.original_shape, self.handle, self.delta())
    }
}

/// Apply a handle manipulation to a shape and return the result.
///
/// Handles that do not apply to the shape (a corner on a line, an endpoint
/// on a rectangle) leave it unchanged.
pub fn apply_manipulation(shape: &Shape, handle: Option<HandleKind>, delta: Vec2) -> Shape {
    let mut shape = shape.clone();

    match handle {
        None => shape.transform(kurbo::Affine::translate(delta)),
        Some(HandleKind::Endpoint(idx)) => {
            if let Shape::Line(line) = &mut shape {
                line.move_endpoint(idx, delta);
            }
        }
        Some(HandleKind::Corner(corner)) => {
            let resized = resized_bounds(shape.bounds(), corner, delta);
            match &mut shape {
                Shape::Rect(rect) => {
                    rect.position = Point::new(resized.x0, resized.y0);
                    rect.width = resized.width();
                    rect.height = resized.height();
                }
                Shape::Image(image) => {
                    image.position = Point::new(resized.x0, resized.y0);
                    image.width = resized.width();
                    image.height = resized.height();
                }
                Shape::Circle(circle) => {
                    circle.center = resized.center();
                    circle.radius = resized.width().max(resized.height()) / 2.0;
                }
                Shape::Freehand(freehand) => {
                    let bounds = points_extent(&freehand.points);
                    let scale_x = resized.width() / bounds.width().max(MIN_EXTENT);
                    let scale_y = resized.height() / bounds.height().max(MIN_EXTENT);
                    for point in &mut freehand.points {
                        point.x = resized.x0 + (point.x - bounds.x0) * scale_x;
                        point.y = resized.y0 + (point.y - bounds.y0) * scale_y;
                    }
                }
                Shape::Line(_) | Shape::Text(_) => {}
            }
        }
    }

    shape
}

fn points_extent(points: &[Point]) -> Rect {
    points
        .iter()
        .fold(Rect::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN), |acc, p| {
            Rect::new(acc.x0.min(p.x), acc.y0.min(p.y), acc.x1.max(p.x), acc.y1.max(p.y))
        })
}

/// Move one corner of `bounds` by `delta` and re-normalize.
fn resized_bounds(bounds: Rect, corner: Corner, delta: Vec2) -> Rect {
    let (x0, y0, x1, y1) = match corner {
        Corner::TopLeft => (bounds.x0 + delta.x, bounds.y0 + delta.y, bounds.x1, bounds.y1),
        Corner::TopRight => (bounds.x0, bounds.y0 + delta.y, bounds.x1 + delta.x, bounds.y1),
        Corner::BottomLeft => (bounds.x0 + delta.x, bounds.y0, bounds.x1, bounds.y1 + delta.y),
        Corner::BottomRight => (bounds.x0, bounds.y0, bounds.x1 + delta.x, bounds.y1 + delta.y),
    };
    let rect = Rect::new(x0, y0, x1, y1).abs();
    Rect::from_origin_size(
        rect.origin(),
        (rect.width().max(MIN_EXTENT), rect.height().max(MIN_EXTENT)),
    )
}
