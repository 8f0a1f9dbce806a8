//! CPU-side pixel sources and the default `image`-backed decoder.

use std::sync::Arc;

use crate::backend::BitmapHandler;
use crate::error::ResourceError;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap raw RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Bitmap`] if `pixels` is not `width * height * 4`
    /// bytes long.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ResourceError::Bitmap(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single-color bitmap.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Where a texture's pixels come from.
#[derive(Debug, Clone)]
pub enum PixelSource {
    /// Encoded image bytes, decoded through the [`BitmapHandler`].
    Encoded(Arc<[u8]>),
    /// Pixels already decoded by the host.
    Decoded(Arc<Bitmap>),
}

/// [`BitmapHandler`] decoding PNG and JPEG through the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageBitmaps;

impl BitmapHandler for ImageBitmaps {
    fn decode(&mut self, encoded: &[u8]) -> Result<Bitmap, ResourceError> {
        let img = image::load_from_memory(encoded)
            .map_err(|e| ResourceError::Bitmap(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Bitmap {
            width,
            height,
            pixels: img.into_raw(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("png encoding");
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let png = encode_png(3, 2, [10, 20, 30, 255]);
        let bitmap = ImageBitmaps.decode(&png).expect("decode");
        assert_eq!((bitmap.width, bitmap.height), (3, 2));
        assert_eq!(bitmap.pixels.len(), 3 * 2 * 4);
        assert_eq!(&bitmap.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_bitmap_error() {
        let err = ImageBitmaps.decode(b"not an image").unwrap_err();
        assert!(matches!(err, ResourceError::Bitmap(_)));
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn solid_fills_every_pixel() {
        let bitmap = Bitmap::solid(2, 1, [1, 2, 3, 4]);
        assert_eq!(bitmap.pixels, vec![1, 2, 3, 4, 1, 2, 3, 4]);
    }
}
