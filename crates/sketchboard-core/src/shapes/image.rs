//! Image shape for embedding raster images.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    #[serde(rename = "webp")]
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// A raster image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredImage")]
pub struct Image {
    #[serde(default = "new_id")]
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    #[serde(flatten)]
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Natural width in pixels.
    pub source_width: u32,
    /// Natural height in pixels.
    pub source_height: u32,
    /// Encoding of `pixel_data`.
    pub format: ImageFormat,
    /// Encoded image bytes, base64.
    pub pixel_data: String,
    /// Style properties (stroke used for optional border).
    #[serde(flatten)]
    pub style: ShapeStyle,
}

/// Stored image record. Older records carry the bytes as a data URL under
/// `src` and omit the natural size and format.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredImage {
    #[serde(default = "new_id")]
    id: ShapeId,
    #[serde(flatten)]
    position: Point,
    width: f64,
    height: f64,
    source_width: Option<u32>,
    source_height: Option<u32>,
    format: Option<ImageFormat>,
    #[serde(alias = "src")]
    pixel_data: String,
    #[serde(flatten)]
    style: ShapeStyle,
}

impl TryFrom<StoredImage> for Image {
    type Error = String;

    fn try_from(stored: StoredImage) -> Result<Self, Self::Error> {
        // "data:image/png;base64,<payload>"
        let pixel_data = match stored.pixel_data.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => payload.to_string(),
            _ => stored.pixel_data,
        };
        let format = match stored.format {
            Some(format) => format,
            None => {
                let bytes = STANDARD
                    .decode(&pixel_data)
                    .map_err(|e| format!("image data is not base64: {e}"))?;
                ImageFormat::from_magic_bytes(&bytes)
                    .ok_or_else(|| "unrecognized image format".to_string())?
            }
        };
        Ok(Self {
            id: stored.id,
            position: stored.position,
            width: stored.width,
            height: stored.height,
            source_width: stored.source_width.unwrap_or(stored.width.abs().round() as u32),
            source_height: stored.source_height.unwrap_or(stored.height.abs().round() as u32),
            format,
            pixel_data,
            style: stored.style,
        })
    }
}

impl Image {
    /// Create an image shape at its natural size.
    pub fn new(
        position: Point,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: new_id(),
            position,
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            pixel_data: STANDARD.encode(data),
            style: ShapeStyle::default(),
        }
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.pixel_data).ok()
    }

    /// Get the bounding rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
        .abs()
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect().inflate(tolerance, tolerance);
        rect.contains(point)
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
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
        self.width *= scale[0].abs();
        self.height *= scale[3].abs();
    }
}
