//! Freehand drawing shape.

use super::{
    ShapeId, ShapeStyle, ShapeTrait, deserialize_points, new_id, point_to_polyline_dist,
    points_bounds,
};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand stroke (series of points).
///
/// Eraser strokes are freehand strokes with `erasing` set; the renderer
/// composites them so they remove underlying ink instead of adding to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freehand {
    #[serde(default = "new_id")]
    pub(crate) id: ShapeId,
    /// Points in drawing order.
    #[serde(deserialize_with = "deserialize_points")]
    pub points: Vec<Point>,
    /// Eraser stroke.
    #[serde(default)]
    pub erasing: bool,
    /// Style properties.
    #[serde(flatten)]
    pub style: ShapeStyle,
}

impl Freehand {
    /// Start a stroke at `origin`.
    pub fn new(origin: Point, erasing: bool) -> Self {
        Self::from_points(vec![origin], erasing)
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, erasing: bool) -> Self {
        Self {
            id: new_id(),
            points,
            erasing,
            style: ShapeStyle::default(),
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some(first) = self.points.first() else {
            return path;
        };

        path.move_to(*first);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }

        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        for point in &mut self.points {
            *point = affine * *point;
        }
    }
}
