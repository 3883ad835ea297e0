//! Raster image import.

use crate::shapes::{Image, ImageFormat};
use kurbo::Point;
use thiserror::Error;

/// Errors from decoding an imported file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no pixels")]
    Empty,
}

/// Decode `bytes` and build an [`Image`] at `position` with its natural size.
///
/// The original encoded bytes are stored on the shape, not the decoded pixels.
pub fn decode_image(bytes: &[u8], position: Point) -> Result<Image, ImportError> {
    let format = ImageFormat::from_magic_bytes(bytes).ok_or(ImportError::UnsupportedFormat)?;
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ImportError::Empty);
    }
    log::debug!("Decoded {:?} image {}x{}", format, width, height);
    Ok(Image::new(position, bytes, width, height, format))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small opaque PNG for tests.
    pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let pixels = vec![200u8; (width * height * 4) as usize];
            writer.write_image_data(&pixels).unwrap();
        }
        data
    }

    #[test]
    fn test_decode_png_natural_size() {
        let bytes = sample_png(3, 2);
        let image = decode_image(&bytes, Point::new(50.0, 50.0)).unwrap();

        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.source_width, image.source_height), (3, 2));
        assert_eq!((image.width, image.height), (3.0, 2.0));
        assert_eq!(image.position, Point::new(50.0, 50.0));
        assert_eq!(image.data().unwrap(), bytes);
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let err = decode_image(b"definitely not an image", Point::ZERO).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let bytes = sample_png(4, 4);
        let err = decode_image(&bytes[..20], Point::ZERO).unwrap_err();
        assert!(matches!(err, ImportError::Decode(_)));
    }
}
