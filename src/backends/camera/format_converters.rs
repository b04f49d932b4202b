// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for captured frames
//!
//! Reassembles interleaved YUYV frames into planar images ready for encoding.

use crate::errors::ReassemblyError;
use crate::media::planar::{PlanarImage, SubsampleRatio};
use tracing::debug;

/// Bytes per pixel of the interleaved YUYV family
pub const YUYV_BYTES_PER_PIXEL: usize = 2;

/// Expected buffer length for a `width` x `height` YUYV frame
pub fn yuyv_frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * YUYV_BYTES_PER_PIXEL
}

/// Convert YUYV (YUV 4:2:2 interleaved) to a planar image
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 luma samples and
/// one chroma pair. For chroma index `i`:
///
/// ```text
/// y[2i]   = data[4i]      cb[i] = data[4i + 1]
/// y[2i+1] = data[4i + 2]  cr[i] = data[4i + 3]
/// ```
///
/// Planes are laid out according to `ratio`. The walk covers every chroma
/// sample of the declared ratio that the buffer can supply; for 4:2:2 and
/// 4:4:0 that is the whole frame.
///
/// The buffer length must be exactly `width * height * 2`.
pub fn yuyv_to_planar(
    data: &[u8],
    width: u32,
    height: u32,
    ratio: SubsampleRatio,
) -> Result<PlanarImage, ReassemblyError> {
    let expected = yuyv_frame_len(width, height);
    if data.len() != expected {
        return Err(ReassemblyError::BufferLengthMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut image = PlanarImage::new(width, height, ratio);
    let pairs = image.cb.len().min(data.len() / 4);

    debug!(
        y = image.y.len(),
        cb = image.cb.len(),
        cr = image.cr.len(),
        frame = data.len(),
        %ratio,
        "Reassembling YUYV frame"
    );

    for (i, group) in data.chunks_exact(4).take(pairs).enumerate() {
        image.y[2 * i] = group[0];
        image.y[2 * i + 1] = group[2];
        image.cb[i] = group[1];
        image.cr[i] = group[3];
    }

    debug!(
        y_offset = image.y_offset(0, 0),
        c_offset = image.c_offset(0, 0),
        y_stride = image.y_stride,
        c_stride = image.c_stride,
        "Planar layout"
    );

    Ok(image)
}
