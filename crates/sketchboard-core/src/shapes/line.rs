//! Line and arrow shape.

use super::{
    ShapeId, ShapeStyle, ShapeTrait, deserialize_points, new_id, point_to_polyline_dist,
    points_bounds,
};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Length of the arrow head barbs, in stroke widths.
const ARROW_HEAD_SCALE: f64 = 5.0;
/// Minimum arrow head length in world units.
const ARROW_HEAD_MIN: f64 = 10.0;

/// A straight line, optionally terminated by an arrow head.
///
/// Drawn lines hold exactly two points. Stored lines may carry more, in which
/// case they render as a polyline and only the first and last are editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    #[serde(default = "new_id")]
    pub(crate) id: ShapeId,
    /// Ordered points, start first.
    #[serde(deserialize_with = "deserialize_points")]
    pub points: Vec<Point>,
    /// Draw an arrow head at the last point.
    #[serde(default)]
    pub arrowed: bool,
    /// Style properties.
    #[serde(flatten)]
    pub style: ShapeStyle,
}

impl Line {
    /// Create a new two-point line.
    pub fn new(start: Point, end: Point, arrowed: bool) -> Self {
        Self {
            id: new_id(),
            points: vec![start, end],
            arrowed,
            style: ShapeStyle::default(),
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Replace the second endpoint, keeping exactly two points.
    pub fn set_end(&mut self, end: Point) {
        let start = self.start().unwrap_or(end);
        self.points.clear();
        self.points.push(start);
        self.points.push(end);
    }

    /// Move the endpoint at `index` (0 = start, anything else = end).
    pub fn move_endpoint(&mut self, index: usize, delta: Vec2) {
        let target = if index == 0 {
            self.points.first_mut()
        } else {
            self.points.last_mut()
        };
        if let Some(point) = target {
            *point += delta;
        }
    }

    /// True when every point coincides with the first.
    pub fn is_degenerate(&self) -> bool {
        match self.start() {
            Some(start) => self.points.iter().all(|p| *p == start),
            None => true,
        }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// The two barb tips of the arrow head, if this line has one.
    pub fn arrow_head(&self) -> Option<(Point, Point)> {
        if !self.arrowed || self.points.len() < 2 {
            return None;
        }
        let tip = self.points[self.points.len() - 1];
        let prev = self.points[self.points.len() - 2];
        let dir = tip - prev;
        if dir.hypot2() < f64::EPSILON {
            return None;
        }
        let dir = dir.normalize();
        let head = (self.style.stroke_width * ARROW_HEAD_SCALE).max(ARROW_HEAD_MIN);
        let back = tip - dir * head;
        let normal = Vec2::new(-dir.y, dir.x) * (head / 2.0);
        Some((back + normal, back - normal))
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut bounds = points_bounds(&self.points);
        if let Some((a, b)) = self.arrow_head() {
            bounds = bounds.union_pt(a).union_pt(b);
        }
        bounds
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.start() else {
            return path;
        };
        if self.is_degenerate() {
            return path;
        }

        path.move_to(first);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }

        if let (Some((a, b)), Some(tip)) = (self.arrow_head(), self.end()) {
            path.move_to(a);
            path.line_to(tip);
            path.line_to(b);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0), false);
        assert!((line.length() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_end_keeps_two_points() {
        let mut line = Line::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0), false);
        line.set_end(Point::new(9.0, 9.0));
        line.set_end(Point::new(4.0, 2.0));
        assert_eq!(line.points, vec![Point::new(1.0, 1.0), Point::new(4.0, 2.0)]);
    }

    #[test]
    fn test_hit_test() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), false);
        assert!(line.hit_test(Point::new(50.0, 2.0), 2.0));
        assert!(!line.hit_test(Point::new(50.0, 20.0), 2.0));
    }

    #[test]
    fn test_arrow_head_only_when_arrowed() {
        let plain = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), false);
        assert!(plain.arrow_head().is_none());

        let arrow = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), true);
        let (a, b) = arrow.arrow_head().unwrap();
        assert!(a.x < 100.0 && b.x < 100.0);
        assert!((a.y + b.y).abs() < 1e-9);
    }

    #[test]
    fn test_move_endpoint() {
        let mut line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), false);
        line.move_endpoint(0, Vec2::new(1.0, 1.0));
        line.move_endpoint(1, Vec2::new(0.0, 5.0));
        assert_eq!(line.points, vec![Point::new(1.0, 1.0), Point::new(10.0, 5.0)]);
    }

    #[test]
    fn test_degenerate_path_is_empty() {
        let p = Point::new(2.0, 2.0);
        let line = Line::new(p, p, true);
        assert!(line.is_degenerate());
        assert!(line.to_path().elements().is_empty());
    }
}
