use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};

pub mod blend;

pub use blend::BlendMode;

/// Encodes a raster as PNG, which round-trips RGBA8 pixels exactly
pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(RasterError::Encode)?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> RasterResult<RgbaImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(RasterError::Decode)?;
    Ok(image.to_rgba8())
}

/// Converts a raster into the image type egui uploads as a texture
pub fn to_color_image(image: &RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

/// A lossless, immutable encoding of a raster
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRaster {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

// The PNG payload is noise in debug output
impl fmt::Debug for EncodedRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

impl EncodedRaster {
    pub fn encode(image: &RgbaImage) -> RasterResult<Self> {
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png: encode_png(image)?,
        })
    }

    pub fn decode(&self) -> RasterResult<RgbaImage> {
        let image = decode_png(&self.png)?;
        if image.dimensions() != self.dimensions() {
            return Err(RasterError::SizeMismatch {
                expected: self.dimensions(),
                actual: image.dimensions(),
            });
        }
        Ok(image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn byte_len(&self) -> usize {
        self.png.len()
    }
}
