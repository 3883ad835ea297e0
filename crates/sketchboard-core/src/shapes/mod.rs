//! Shape definitions for the drawing surface.

mod circle;
mod freehand;
mod image;
mod line;
mod rectangle;
mod text;

pub use circle::Circle;
pub use freehand::Freehand;
pub use image::{Image, ImageFormat};
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::Text;

use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Fresh identifier, also used when a stored record carries none.
pub(crate) fn new_id() -> ShapeId {
    Uuid::new_v4()
}

/// Error produced when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}: expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// Serializable color representation (RGBA8).
///
/// Serialized as a hex string: `#rrggbb` when opaque, `#rrggbbaa` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(input.to_string());
        let hex = input.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(err());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());

        match hex.len() {
            3 => {
                let nibble = |i: usize| byte(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            8 => Ok(Self::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => Err(err()),
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_hex()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by every shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Stroke color (fill color for text).
    #[serde(default = "SerializableColor::black")]
    pub color: SerializableColor,
    /// Stroke width, always positive.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

fn default_stroke_width() -> f64 {
    2.0
}

impl ShapeStyle {
    pub fn new(color: SerializableColor, stroke_width: f64) -> Self {
        Self {
            color,
            stroke_width,
        }
    }

    /// Get the color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.color.into()
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = kurbo::Vec2::new(b.x - a.x, b.y - a.y);
    let pv = kurbo::Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Deserialize a point list written either as `[{"x": .., "y": ..}, ..]` or
/// as a flat `[x0, y0, x1, y1, ..]` array.
pub(crate) fn deserialize_points<'de, D>(deserializer: D) -> Result<Vec<Point>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PointList {
        Pairs(Vec<Point>),
        Flat(Vec<f64>),
    }

    match PointList::deserialize(deserializer)? {
        PointList::Pairs(points) => Ok(points),
        PointList::Flat(coords) if coords.len() % 2 == 0 => Ok(coords
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect()),
        PointList::Flat(coords) => Err(de::Error::custom(format!(
            "flat point list has odd length {}",
            coords.len()
        ))),
    }
}

/// Bounding box of a point sequence.
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in world coordinates, sign-normalized.
    fn bounds(&self) -> Rect;

    /// Check if a point (in world coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the path representation for rendering.
    fn to_path(&self) -> BezPath;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Apply a transform to this shape.
    fn transform(&mut self, affine: Affine);
}

/// Enum wrapper for all shape types.
///
/// This is the persisted form: `{"type": "rect", "id": .., "x": .., ...}`.
/// Deserialization also accepts the older `pencil`, `eraser` and `arrow`
/// tags, which are folded into `Freehand` and `Line`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Rect(Rectangle),
    Circle(Circle),
    Line(Line),
    Freehand(Freehand),
    Text(Text),
    Image(Image),
}

/// Every tag a stored record may carry.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoredShape {
    Rect(Rectangle),
    Circle(Circle),
    Line(Line),
    Freehand(Freehand),
    Text(Text),
    Image(Image),
    Pencil(Freehand),
    Eraser(Freehand),
    Arrow(Line),
}

impl From<StoredShape> for Shape {
    fn from(stored: StoredShape) -> Self {
        match stored {
            StoredShape::Rect(rect) => Shape::Rect(rect),
            StoredShape::Circle(circle) => Shape::Circle(circle),
            StoredShape::Line(line) => Shape::Line(line),
            StoredShape::Freehand(freehand) => Shape::Freehand(freehand),
            StoredShape::Text(text) => Shape::Text(text),
            StoredShape::Image(image) => Shape::Image(image),
            StoredShape::Pencil(freehand) => Shape::Freehand(Freehand {
                erasing: false,
                ..freehand
            }),
            StoredShape::Eraser(freehand) => Shape::Freehand(Freehand {
                erasing: true,
                ..freehand
            }),
            StoredShape::Arrow(line) => Shape::Line(Line {
                arrowed: true,
                ..line
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StoredShape::deserialize(deserializer).map(Shape::from)
    }
}

macro_rules! dispatch {
    ($shape:expr, $s:ident => $body:expr) => {
        match $shape {
            Shape::Rect($s) => $body,
            Shape::Circle($s) => $body,
            Shape::Line($s) => $body,
            Shape::Freehand($s) => $body,
            Shape::Text($s) => $body,
            Shape::Image($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn transform(&mut self, affine: Affine) {
        dispatch!(self, s => s.transform(affine))
    }

    /// Give the shape a new identity.
    pub(crate) fn regenerate_id(&mut self) {
        dispatch!(self, s => s.id = new_id())
    }

    /// Short name of the variant, matching the serialized `type` tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Rect(_) => "rect",
            Shape::Circle(_) => "circle",
            Shape::Line(_) => "line",
            Shape::Freehand(_) => "freehand",
            Shape::Text(_) => "text",
            Shape::Image(_) => "image",
        }
    }

    /// Advance a draft's geometry to follow the pointer.
    ///
    /// - Rect: width/height become the signed delta from the origin.
    /// - Circle: radius becomes the distance from the center.
    /// - Line: the second endpoint is replaced.
    /// - Freehand: the pointer is appended.
    ///
    /// # Panics
    ///
    /// Text and Image shapes have no draft geometry. Reaching this with one
    /// of them is a bug in the caller.
    pub fn update_draft(&mut self, pointer: Point) {
        match self {
            Shape::Rect(rect) => {
                rect.width = pointer.x - rect.position.x;
                rect.height = pointer.y - rect.position.y;
            }
            Shape::Circle(circle) => {
                circle.radius = circle.center.distance(pointer);
            }
            Shape::Line(line) => line.set_end(pointer),
            Shape::Freehand(freehand) => freehand.add_point(pointer),
            Shape::Text(_) | Shape::Image(_) => {
                unreachable!("update_draft called on a {} shape", self.kind_name())
            }
        }
    }

    /// Whether the shape collapsed to nothing and should not be committed.
    ///
    /// Only lines and arrows are discarded; zero-area rects and circles are kept.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Line(line) => line.is_degenerate(),
            _ => false,
        }
    }
}
