// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The capture core talks to hardware only through two traits:
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureScheduler   │  ← Pacing, naming, persistence
//! └──────────┬──────────┘
//!            │ one cycle per frame
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← open → configure → stream → wait → drain → close
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend trait │  ← open(path) → Box<dyn CaptureDevice>
//! └──────────┬──────────┘
//!            │
//!            ▼
//!       ┌────────┐
//!       │  V4L2  │  ← Concrete implementation
//!       └────────┘
//! ```

pub mod format_converters;
pub mod negotiation;
pub mod session;
pub mod testing;
pub mod types;
pub mod v4l2;
pub mod v4l2_utils;

pub use negotiation::{NegotiatedFormat, negotiate_format, sorted_frame_sizes};
pub use session::{CaptureRequest, CaptureSession, capture_one_frame};
pub use types::*;
pub use v4l2::V4l2Backend;

use std::time::Duration;

/// Opens capture devices by path
///
/// Every call must return a fresh, independent handle. Handles are never
/// shared between sessions.
pub trait CameraBackend {
    /// Open the device at `path`
    fn open(&self, path: &str) -> BackendResult<Box<dyn CaptureDevice>>;
}

/// An open capture device
///
/// Dropping the handle closes the device and releases its buffers.
pub trait CaptureDevice {
    // ===== Capabilities =====

    /// Pixel formats the device supports, in driver enumeration order
    fn supported_formats(&self) -> BackendResult<Vec<PixelFormatDescriptor>>;

    /// Frame sizes supported for a pixel format
    fn supported_sizes(&self, fourcc: FourCc) -> BackendResult<Vec<FrameSize>>;

    // ===== Lifecycle =====

    /// Apply a format; returns what the driver actually accepted
    fn set_format(&mut self, fourcc: FourCc, width: u32, height: u32)
    -> BackendResult<AppliedFormat>;

    /// Allocate buffers and switch the device into streaming mode
    fn start_streaming(&mut self) -> BackendResult<()>;

    // ===== Capture =====

    /// Block until a frame is ready or `timeout` elapses
    ///
    /// A timeout is reported as [`BackendError::Timeout`] and must be
    /// distinguishable from every other failure.
    fn wait_for_frame(&mut self, timeout: Duration) -> BackendResult<()>;

    /// Read the next queued frame without blocking
    fn read_frame(&mut self) -> BackendResult<Vec<u8>>;
}
