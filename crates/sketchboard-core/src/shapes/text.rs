//! Text shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// A block of text anchored at its top-left corner.
///
/// Geometry is fixed at creation; only `content` changes while editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default = "new_id")]
    pub(crate) id: ShapeId,
    /// Top-left corner.
    #[serde(flatten)]
    pub position: Point,
    /// The text content.
    #[serde(alias = "text")]
    pub content: String,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Style properties.
    #[serde(flatten)]
    pub style: ShapeStyle,
}

fn default_font_size() -> f64 {
    Text::DEFAULT_FONT_SIZE
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Create a new text shape.
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            style: ShapeStyle::default(),
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Approximate layout size from character count and font size.
    /// The renderer owns real text layout; this is only used for hit testing.
    fn approximate_size(&self) -> (f64, f64) {
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let lines = self.content.lines().count().max(1);
        (
            widest as f64 * self.font_size * CHAR_WIDTH_FACTOR,
            lines as f64 * self.font_size * LINE_HEIGHT,
        )
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let (width, height) = self.approximate_size();
        Rect::from_origin_size(self.position, (width, height))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyphs come from the renderer; the path is the layout box.
        self.bounds().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let scale = affine.as_coeffs();
        self.font_size *= scale[3].abs();
    }
}
