// SPDX-License-Identifier: GPL-3.0-only

//! Error types for frame capture

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Format negotiation errors
    Format(FormatError),
    /// Capture session errors
    Capture(CaptureError),
    /// Frame reassembly errors
    Reassembly(ReassemblyError),
    /// Photo encoding errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Capability negotiation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Device does not offer the requested format family
    NoMatchingFormat(String),
    /// Format label ends in a subsampling token we do not know
    UnknownSubsampling(String),
    /// Device reports no frame sizes for the format
    NoFrameSizes(String),
    /// Requested frame size is not offered by the device
    SizeNotSupported(String),
    /// Querying the device failed
    Query(BackendError),
}

/// Capture session errors, tagged with the lifecycle stage that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Device could not be opened
    Open(BackendError),
    /// Negotiated format could not be applied
    Configure(BackendError),
    /// Streaming could not be started
    StartStreaming(BackendError),
    /// Waiting for a frame failed with something other than a timeout
    WaitForFrame(BackendError),
    /// The first read after a successful wait failed
    FirstRead(BackendError),
    /// The first read after a successful wait returned no data
    EmptyFrame,
    /// The session was used after its device handle was released
    SessionClosed,
    /// Stop was requested while retrying after a wait timeout
    Interrupted,
}

/// Frame reassembly errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyError {
    /// Raw buffer length does not match the negotiated size
    BufferLengthMismatch { expected: usize, actual: usize },
}

/// Photo encoding errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// Encoding failed
    EncodingFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Format(e) => write!(f, "Format error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Reassembly(e) => write!(f, "Reassembly error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::NoMatchingFormat(family) => write!(f, "No {} format found", family),
            FormatError::UnknownSubsampling(ratio) => {
                write!(f, "Unknown subsample ratio: {}", ratio)
            }
            FormatError::NoFrameSizes(format) => {
                write!(f, "No frame sizes reported for format {}", format)
            }
            FormatError::SizeNotSupported(size) => write!(f, "Frame size {} not supported", size),
            FormatError::Query(e) => write!(f, "Device query failed: {}", e),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Open(e) => write!(f, "open: {}", e),
            CaptureError::Configure(e) => write!(f, "set format: {}", e),
            CaptureError::StartStreaming(e) => write!(f, "start streaming: {}", e),
            CaptureError::WaitForFrame(e) => write!(f, "wait for frame: {}", e),
            CaptureError::FirstRead(e) => write!(f, "reading frame after wait: {}", e),
            CaptureError::EmptyFrame => write!(f, "empty frame after wait"),
            CaptureError::SessionClosed => write!(f, "device already closed"),
            CaptureError::Interrupted => write!(f, "interrupted while retrying"),
        }
    }
}

impl fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReassemblyError::BufferLengthMismatch { expected, actual } => write!(
                f,
                "frame is {} bytes, expected {} for the negotiated size",
                actual, expected
            ),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FormatError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for ReassemblyError {}
impl std::error::Error for PhotoError {}

// Conversions from sub-errors to AppError
impl From<FormatError> for AppError {
    fn from(err: FormatError) -> Self {
        AppError::Format(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<ReassemblyError> for AppError {
    fn from(err: ReassemblyError) -> Self {
        AppError::Reassembly(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<BackendError> for FormatError {
    fn from(err: BackendError) -> Self {
        FormatError::Query(err)
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
