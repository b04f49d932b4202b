// SPDX-License-Identifier: GPL-3.0-only

//! Capability negotiation
//!
//! Picks the pixel format for a capture run and lists its frame sizes.
//! All queries are read-only; nothing is applied to the device here.

use super::CaptureDevice;
use super::types::{FourCc, FrameSize, PixelFormatDescriptor};
use crate::errors::FormatError;
use crate::media::planar::SubsampleRatio;
use tracing::{debug, info};

/// Format chosen for a run, fixed for every reopen of the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    pub descriptor: PixelFormatDescriptor,
    /// Present only for the interleaved YUYV family
    pub subsampling: Option<SubsampleRatio>,
}

/// Select the first format whose label starts with `family`
///
/// Only when no label matches is `family` tried as a FourCC, again taking the
/// first match. For the YUYV family the subsampling ratio is derived from the label's
/// trailing token; an unrecognized token is fatal. Other families carry no
/// ratio and their frames are passed through unmodified.
pub fn negotiate_format(
    device: &dyn CaptureDevice,
    family: &str,
) -> Result<NegotiatedFormat, FormatError> {
    let mut formats = device.supported_formats()?;
    debug!(count = formats.len(), family, "Supported formats queried");

    let index = formats
        .iter()
        .position(|f| f.belongs_to(family))
        .or_else(|| formats.iter().position(|f| f.has_fourcc(family)))
        .ok_or_else(|| FormatError::NoMatchingFormat(family.to_string()))?;
    let descriptor = formats.swap_remove(index);

    let subsampling = if descriptor.is_interleaved_yuyv() {
        let ratio = SubsampleRatio::from_label(&descriptor.label)
            .map_err(FormatError::UnknownSubsampling)?;
        Some(ratio)
    } else {
        None
    };

    info!(
        format = %descriptor,
        subsampling = ?subsampling.map(|r| r.as_str()),
        "Negotiated pixel format"
    );

    Ok(NegotiatedFormat {
        descriptor,
        subsampling,
    })
}

/// Frame sizes for `fourcc`, smallest area first
pub fn sorted_frame_sizes(
    device: &dyn CaptureDevice,
    fourcc: FourCc,
) -> Result<Vec<FrameSize>, FormatError> {
    let mut sizes = device.supported_sizes(fourcc)?;
    if sizes.is_empty() {
        return Err(FormatError::NoFrameSizes(fourcc.to_string()));
    }
    sort_by_area(&mut sizes);
    Ok(sizes)
}

/// Sort ascending by pixel area
pub fn sort_by_area(sizes: &mut [FrameSize]) {
    sizes.sort_by_key(|s| s.area());
}
