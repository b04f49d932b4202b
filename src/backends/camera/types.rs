// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::YUYV_FAMILY;
use std::time::Instant;

/// Four-character pixel format code (e.g. `YUYV`, `MJPG`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        FourCc(*code)
    }

    /// Parse a FourCC from a string, padding short codes with spaces (`"Y16"` -> `"Y16 "`)
    pub fn parse(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !code.is_ascii() {
            return None;
        }
        let mut repr = [b' '; 4];
        repr[..bytes.len()].copy_from_slice(bytes);
        Some(FourCc(repr))
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A pixel format as reported by the driver: code plus descriptive label
///
/// The label carries the subsampling suffix for YUV formats, e.g. `"YUYV 4:2:2"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub fourcc: FourCc,
    pub label: String,
}

impl PixelFormatDescriptor {
    pub fn new(fourcc: FourCc, label: impl Into<String>) -> Self {
        Self {
            fourcc,
            label: label.into(),
        }
    }

    /// Whether the label starts with the given 4-character family tag
    pub fn belongs_to(&self, family: &str) -> bool {
        self.label.get(..4) == Some(family)
    }

    /// Whether `code` names this format's FourCC
    pub fn has_fourcc(&self, code: &str) -> bool {
        FourCc::parse(code) == Some(self.fourcc)
    }

    /// Whether this is the interleaved YUYV family the reassembler understands
    pub fn is_interleaved_yuyv(&self) -> bool {
        self.belongs_to(YUYV_FAMILY)
    }
}

impl std::fmt::Display for PixelFormatDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.fourcc)
    }
}

/// Frame size advertised for a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub max_width: u32,
    pub max_height: u32,
}

impl FrameSize {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Pixel area, the sort key for presenting sizes
    pub fn area(&self) -> u64 {
        self.max_width as u64 * self.max_height as u64
    }

    /// Parse `"640x480"`
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().split_once(['x', 'X'])?;
        Some(Self::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)
    }
}

/// Format actually applied by the driver after a `set_format` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedFormat {
    pub fourcc: FourCc,
    pub width: u32,
    pub height: u32,
}

/// Raw frame bytes delivered by the device for one capture
#[derive(Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub captured_at: Instant,
}

impl RawFrame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            captured_at: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawFrame({} bytes)", self.data.len())
    }
}

/// Device node discovered under `/dev`
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Camera device not found
    DeviceNotFound(String),
    /// Device exists but could not be opened (permissions, busy)
    OpenFailed(String),
    /// Format not supported or rejected by the driver
    FormatNotSupported(String),
    /// Driver refused to start streaming
    StreamingFailed(String),
    /// No frame became available within the wait timeout
    Timeout,
    /// General I/O error
    IoError(String),
}

impl BackendError {
    /// Whether this is the recoverable frame-wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::StreamingFailed(msg) => write!(f, "Streaming failed: {}", msg),
            BackendError::Timeout => write!(f, "Timed out waiting for frame"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => BackendError::Timeout,
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_parse_pads_short_codes() {
        assert_eq!(FourCc::parse("Y16"), Some(FourCc::new(b"Y16 ")));
        assert_eq!(FourCc::parse("YUYV"), Some(FourCc::new(b"YUYV")));
        assert_eq!(FourCc::parse(""), None);
        assert_eq!(FourCc::parse("TOOLONG"), None);
    }

    #[test]
    fn test_family_match_uses_label_prefix() {
        let yuyv = PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2");
        let mjpg = PixelFormatDescriptor::new(FourCc::new(b"MJPG"), "Motion-JPEG");

        assert!(yuyv.is_interleaved_yuyv());
        assert!(!mjpg.is_interleaved_yuyv());
        assert!(mjpg.belongs_to("Moti"));
        assert!(!mjpg.belongs_to("MJPG"));
        assert!(!mjpg.belongs_to("YUYV"));
    }

    #[test]
    fn test_fourcc_match_ignores_label() {
        let legacy = PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUV 4:2:2 (YUYV)");

        assert!(!legacy.belongs_to("YUYV"));
        assert!(!legacy.is_interleaved_yuyv());
        assert!(legacy.has_fourcc("YUYV"));
        assert!(!legacy.has_fourcc("MJPG"));
    }

    #[test]
    fn test_frame_size_parse() {
        assert_eq!(FrameSize::parse("640x480"), Some(FrameSize::new(640, 480)));
        assert_eq!(FrameSize::parse(" 1280X720 "), Some(FrameSize::new(1280, 720)));
        assert_eq!(FrameSize::parse("640"), None);
        assert_eq!(FrameSize::parse("axb"), None);
    }

    #[test]
    fn test_timeout_io_error_maps_to_timeout() {
        let err: BackendError = std::io::Error::new(std::io::ErrorKind::TimedOut, "poll").into();
        assert!(err.is_timeout());

        let err: BackendError = std::io::Error::other("boom").into();
        assert!(!err.is_timeout());
    }
}
