// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of reassembled frames

use crate::constants::DEFAULT_JPEG_QUALITY;
use crate::errors::PhotoError;
use crate::media::planar::PlanarImage;
use image::RgbImage;
use tracing::debug;

/// Encoded image data ready for saving
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Create a new encoder at maximum JPEG quality
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Create an encoder with a JPEG quality, clamped to 1..=100
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a planar image as JPEG
    pub fn encode_planar(&self, planar: &PlanarImage) -> Result<EncodedImage, PhotoError> {
        let rgb = planar.to_rgb();
        let data = self.encode_jpeg(&rgb)?;

        debug!(
            width = planar.width,
            height = planar.height,
            quality = self.quality,
            size = data.len(),
            "Encoding complete"
        );

        Ok(EncodedImage {
            data,
            width: planar.width,
            height: planar.height,
        })
    }

    fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, self.quality);

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::planar::SubsampleRatio;

    #[test]
    fn test_default_quality_is_maximum() {
        assert_eq!(PhotoEncoder::new().quality(), 100);
        assert_eq!(PhotoEncoder::with_quality(0).quality(), 1);
        assert_eq!(PhotoEncoder::with_quality(200).quality(), 100);
    }

    #[test]
    fn test_encode_planar_produces_jpeg() {
        let mut planar = PlanarImage::new(16, 8, SubsampleRatio::Ratio422);
        planar.y.fill(200);
        planar.cb.fill(128);
        planar.cr.fill(128);

        let encoded = PhotoEncoder::new().encode_planar(&planar).unwrap();
        assert_eq!((encoded.width, encoded.height), (16, 8));
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
        let px = decoded.get_pixel(4, 4);
        assert!(px.0.iter().all(|&c| (190..=210).contains(&c)), "{:?}", px);
    }
}
