//! PNG and PDF export.
//!
//! Both formats are pure reads of the shape list. Turning shapes into pixels
//! is the renderer's job, reached through [`Rasterizer`].

use crate::shapes::Shape;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Raster is {width}x{height} but holds {actual} bytes, expected {expected}")]
    InvalidRaster {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Raster has no pixels")]
    EmptyRaster,
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

/// An RGBA8 bitmap, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyRaster);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ExportError::InvalidRaster {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self { width, height, rgba })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Drop alpha by compositing over white.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.rgba.len() / 4 * 3);
        for px in self.rgba.chunks_exact(4) {
            let alpha = px[3] as u32;
            for &channel in &px[..3] {
                let blended = (channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
                rgb.push(blended as u8);
            }
        }
        rgb
    }
}

/// Renders shapes to a bitmap of the visible surface.
pub trait Rasterizer {
    fn rasterize(&self, shapes: &[Shape]) -> Result<Raster, ExportError>;
}

/// PDF page size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };

    /// Same page turned sideways.
    pub fn landscape(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Render `shapes` and encode the result as PNG.
pub fn export_png(shapes: &[Shape], rasterizer: &dyn Rasterizer) -> Result<Vec<u8>, ExportError> {
    let raster = rasterizer.rasterize(shapes)?;
    let data = encode_png(&raster)?;
    log::info!(
        "Exported {} shapes as {}x{} PNG ({} bytes)",
        shapes.len(),
        raster.width(),
        raster.height(),
        data.len()
    );
    Ok(data)
}

/// Encode a raster as an RGBA8 PNG.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, ExportError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, raster.width(), raster.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.rgba())?;
    }
    Ok(png_data)
}

/// Render `shapes` and embed the result in a single-page PDF.
///
/// The bitmap is stretched to cover the whole page.
pub fn export_pdf(
    shapes: &[Shape],
    rasterizer: &dyn Rasterizer,
    page: PageSize,
) -> Result<Vec<u8>, ExportError> {
    let raster = rasterizer.rasterize(shapes)?;
    let data = encode_pdf(&raster, page)?;
    log::info!(
        "Exported {} shapes as {}x{} pt PDF ({} bytes)",
        shapes.len(),
        page.width,
        page.height,
        data.len()
    );
    Ok(data)
}

/// Build a one-page PDF whose only content is `raster`.
pub fn encode_pdf(raster: &Raster, page: PageSize) -> Result<Vec<u8>, ExportError> {
    let width = Object::Real(page.width as f32);
    let height = Object::Real(page.height as f32);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(raster.width() as i64),
            "Height" => Object::Integer(raster.height() as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
        },
        raster.to_rgb(),
    ));

    // Image space is the unit square; scale it up to the page.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.clone(),
                    Object::Integer(0),
                    Object::Integer(0),
                    height.clone(),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), width, height],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;
    use kurbo::Point;

    /// Paints a solid raster, one pixel column per shape.
    struct SolidRasterizer {
        color: [u8; 4],
    }

    impl Rasterizer for SolidRasterizer {
        fn rasterize(&self, shapes: &[Shape]) -> Result<Raster, ExportError> {
            let width = shapes.len().max(1) as u32;
            let height = 2;
            let rgba = self.color.repeat((width * height) as usize);
            Raster::new(width, height, rgba)
        }
    }

    struct BrokenRasterizer;

    impl Rasterizer for BrokenRasterizer {
        fn rasterize(&self, _shapes: &[Shape]) -> Result<Raster, ExportError> {
            Err(ExportError::Render("no surface".to_string()))
        }
    }

    fn shapes() -> Vec<Shape> {
        vec![
            Shape::Rect(Rectangle::new(Point::ZERO, 10.0, 10.0)),
            Shape::Rect(Rectangle::new(Point::new(20.0, 0.0), 10.0, 10.0)),
        ]
    }

    #[test]
    fn test_raster_validation() {
        assert!(matches!(Raster::new(0, 4, vec![]), Err(ExportError::EmptyRaster)));
        assert!(matches!(
            Raster::new(2, 2, vec![0; 15]),
            Err(ExportError::InvalidRaster { expected: 16, actual: 15, .. })
        ));
        assert!(Raster::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_to_rgb_composites_over_white() {
        let raster = Raster::new(2, 1, vec![255, 0, 0, 255, 0, 0, 0, 0]).unwrap();
        assert_eq!(raster.to_rgb(), vec![255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_export_png_decodes() {
        let rasterizer = SolidRasterizer {
            color: [10, 20, 30, 255],
        };
        let bytes = export_png(&shapes(), &rasterizer).unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, png::ColorType::Rgba);

        let mut buf = vec![0; reader.output_buffer_size()];
        reader.next_frame(&mut buf).unwrap();
        assert_eq!(&buf[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_export_pdf_single_page() {
        let rasterizer = SolidRasterizer {
            color: [0, 0, 0, 255],
        };
        let bytes = export_pdf(&shapes(), &rasterizer, PageSize::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_render_failure_propagates() {
        assert!(matches!(
            export_png(&shapes(), &BrokenRasterizer),
            Err(ExportError::Render(_))
        ));
        assert!(export_pdf(&shapes(), &BrokenRasterizer, PageSize::A4).is_err());
    }

    #[test]
    fn test_landscape() {
        let page = PageSize::A4.landscape();
        assert_eq!((page.width, page.height), (842.0, 595.0));
    }
}
