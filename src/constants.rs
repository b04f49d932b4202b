// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Label prefix of the interleaved 4:2:2 family the reassembler handles
pub const YUYV_FAMILY: &str = "YUYV";

/// Capture session timing
pub mod timing {
    use super::Duration;

    /// How long to wait for the first frame before reopening the device
    pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Settle time between starting the stream and waiting for a frame
    pub const STABILIZATION_DELAY: Duration = Duration::from_secs(1);

    /// Sleep step while waiting for the next capture slot
    pub const PACING_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// Number of mmap buffers requested from the driver
pub const STREAM_BUFFER_COUNT: u32 = 4;

/// JPEG quality used for reassembled frames
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Output file name prefix
pub const FRAME_FILE_PREFIX: &str = "Frame";

/// Output file extension
pub const FRAME_FILE_EXTENSION: &str = "jpg";

/// Device node name prefix under `/dev`
pub const VIDEO_DEVICE_PREFIX: &str = "video";
