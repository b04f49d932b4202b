// SPDX-License-Identifier: GPL-3.0-only

//! Frame-to-file photo pipeline
//!
//! ```text
//! RawFrame ──▶ is_interleaved_yuyv? ──yes──▶ yuyv_to_planar ──▶ JPEG
//!                     │
//!                     └──no──▶ raw bytes, unmodified
//! ```

pub mod encoding;

pub use encoding::{EncodedImage, PhotoEncoder};

use crate::backends::camera::format_converters::yuyv_to_planar;
use crate::backends::camera::{FrameSize, NegotiatedFormat, RawFrame};
use crate::errors::AppResult;
use tracing::debug;

/// Bytes ready to be written for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutput {
    /// Reassembled and JPEG encoded
    Encoded(Vec<u8>),
    /// Device bytes written as delivered
    PassThrough(Vec<u8>),
}

impl FrameOutput {
    pub fn bytes(&self) -> &[u8] {
        match self {
            FrameOutput::Encoded(data) | FrameOutput::PassThrough(data) => data,
        }
    }
}

/// Converts captured frames into file contents
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new(encoder: PhotoEncoder) -> Self {
        Self { encoder }
    }

    /// Reassemble and encode a frame, or pass it through when the negotiated
    /// format is not the interleaved YUYV family
    pub fn process(
        &self,
        frame: RawFrame,
        format: &NegotiatedFormat,
        size: FrameSize,
    ) -> AppResult<FrameOutput> {
        let ratio = match format.subsampling {
            Some(ratio) if format.descriptor.is_interleaved_yuyv() => ratio,
            _ => {
                debug!(format = %format.descriptor, bytes = frame.len(), "Passing frame through");
                return Ok(FrameOutput::PassThrough(frame.data));
            }
        };

        let planar = yuyv_to_planar(&frame.data, size.max_width, size.max_height, ratio)?;
        let encoded = self.encoder.encode_planar(&planar)?;
        Ok(FrameOutput::Encoded(encoded.data))
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new(PhotoEncoder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{FourCc, PixelFormatDescriptor};
    use crate::errors::{AppError, ReassemblyError};
    use crate::media::planar::SubsampleRatio;

    fn yuyv_format() -> NegotiatedFormat {
        NegotiatedFormat {
            descriptor: PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2"),
            subsampling: Some(SubsampleRatio::Ratio422),
        }
    }

    #[test]
    fn test_yuyv_frame_is_encoded() {
        let frame = RawFrame::new(vec![128; 8 * 4 * 2]);
        let out = PhotoPipeline::default()
            .process(frame, &yuyv_format(), FrameSize::new(8, 4))
            .unwrap();

        assert!(matches!(out, FrameOutput::Encoded(_)));
        assert_eq!(&out.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_other_family_passes_through() {
        let format = NegotiatedFormat {
            descriptor: PixelFormatDescriptor::new(FourCc::new(b"MJPG"), "Motion-JPEG"),
            subsampling: None,
        };
        let frame = RawFrame::new(vec![1, 2, 3]);

        let out = PhotoPipeline::default()
            .process(frame, &format, FrameSize::new(8, 4))
            .unwrap();
        assert_eq!(out, FrameOutput::PassThrough(vec![1, 2, 3]));
    }

    #[test]
    fn test_short_yuyv_frame_is_fatal() {
        let frame = RawFrame::new(vec![0; 10]);
        let err = PhotoPipeline::default()
            .process(frame, &yuyv_format(), FrameSize::new(8, 4))
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Reassembly(ReassemblyError::BufferLengthMismatch {
                expected: 64,
                actual: 10
            })
        ));
    }
}
