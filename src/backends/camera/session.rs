// SPDX-License-Identifier: GPL-3.0-only

//! Single-frame capture sessions
//!
//! A [`CaptureSession`] owns one device handle for one capture cycle:
//!
//! ```text
//! Closed → Opened → Configured → Streaming → FrameReady ──→ Closed
//!                                    │
//!                                    └─ TimedOut ──→ Closed (cycle restarts)
//! ```
//!
//! The handle is released by [`CaptureSession::close`] or, at the latest,
//! when the session is dropped, so every exit path closes the device before
//! the next cycle can reopen it. Nothing is carried over between cycles; the format is
//! re-applied after every open.

use super::types::{AppliedFormat, FourCc, FrameSize, RawFrame};
use super::{CameraBackend, CaptureDevice};
use crate::constants::timing;
use crate::errors::CaptureError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Opened,
    Configured,
    Streaming,
    FrameReady,
    TimedOut,
    /// Handle released; every further device call fails
    Closed,
}

/// Outcome of waiting for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameWait {
    Ready,
    TimedOut,
}

/// Everything needed to run capture cycles against one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub device_path: String,
    pub fourcc: FourCc,
    pub size: FrameSize,
    pub frame_timeout: Duration,
    pub stabilization_delay: Duration,
}

impl CaptureRequest {
    pub fn new(device_path: impl Into<String>, fourcc: FourCc, size: FrameSize) -> Self {
        Self {
            device_path: device_path.into(),
            fourcc,
            size,
            frame_timeout: timing::FRAME_TIMEOUT,
            stabilization_delay: timing::STABILIZATION_DELAY,
        }
    }
}

/// One open device handle and where it is in its lifecycle
pub struct CaptureSession {
    device: Option<Box<dyn CaptureDevice>>,
    device_path: String,
    state: SessionState,
}

impl CaptureSession {
    /// Acquire a fresh handle for `device_path`
    pub fn open(backend: &dyn CameraBackend, device_path: &str) -> Result<Self, CaptureError> {
        let device = backend.open(device_path).map_err(CaptureError::Open)?;
        debug!(device_path, "Device opened");
        Ok(Self {
            device: Some(device),
            device_path: device_path.to_string(),
            state: SessionState::Opened,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read-only access for capability queries
    pub fn device(&self) -> Result<&dyn CaptureDevice, CaptureError> {
        self.device.as_deref().ok_or(CaptureError::SessionClosed)
    }

    fn device_mut(&mut self) -> Result<&mut (dyn CaptureDevice + 'static), CaptureError> {
        self.device.as_deref_mut().ok_or(CaptureError::SessionClosed)
    }

    /// Release the device handle
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!(device_path = %self.device_path, state = ?self.state, "Closing device");
            self.state = SessionState::Closed;
        }
    }

    /// Apply the negotiated format and size
    pub fn configure(
        &mut self,
        fourcc: FourCc,
        size: FrameSize,
    ) -> Result<AppliedFormat, CaptureError> {
        let applied = self
            .device_mut()?
            .set_format(fourcc, size.max_width, size.max_height)
            .map_err(CaptureError::Configure)?;

        if applied.fourcc != fourcc
            || applied.width != size.max_width
            || applied.height != size.max_height
        {
            warn!(
                requested = %format!("{} {}", fourcc, size),
                applied = %format!("{} {}x{}", applied.fourcc, applied.width, applied.height),
                "Driver adjusted the requested format"
            );
        }

        self.state = SessionState::Configured;
        Ok(applied)
    }

    /// Start streaming, then give the sensor `stabilization` to settle
    pub fn start_streaming(&mut self, stabilization: Duration) -> Result<(), CaptureError> {
        self.device_mut()?
            .start_streaming()
            .map_err(CaptureError::StartStreaming)?;
        self.state = SessionState::Streaming;

        info!(
            device_path = %self.device_path,
            delay_ms = stabilization.as_millis() as u64,
            "Streaming started, waiting to stabilize"
        );
        if !stabilization.is_zero() {
            std::thread::sleep(stabilization);
        }
        Ok(())
    }

    /// Wait up to `timeout` for a frame
    ///
    /// A timeout is returned as [`FrameWait::TimedOut`]; any other failure is fatal.
    pub fn wait_for_frame(&mut self, timeout: Duration) -> Result<FrameWait, CaptureError> {
        match self.device_mut()?.wait_for_frame(timeout) {
            Ok(()) => {
                self.state = SessionState::FrameReady;
                Ok(FrameWait::Ready)
            }
            Err(e) if e.is_timeout() => {
                self.state = SessionState::TimedOut;
                Ok(FrameWait::TimedOut)
            }
            Err(e) => Err(CaptureError::WaitForFrame(e)),
        }
    }

    /// Read the first frame, then drain the queue and keep the newest
    ///
    /// The first read must succeed with data. Afterwards every successful
    /// non-empty read replaces the held frame; the first failed or empty read
    /// ends the drain and the last good frame is returned. A failed read here
    /// is not distinguished from an empty one.
    pub fn read_latest(&mut self) -> Result<RawFrame, CaptureError> {
        let device = self.device_mut()?;
        let mut latest = device.read_frame().map_err(CaptureError::FirstRead)?;
        if latest.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        debug!(len = latest.len(), "Frame read");

        let mut drained = 0usize;
        loop {
            match device.read_frame() {
                Ok(frame) if !frame.is_empty() => {
                    latest = frame;
                    drained += 1;
                }
                Ok(_) => {
                    debug!(drained, "Drain stopped on empty read");
                    break;
                }
                Err(e) => {
                    debug!(drained, error = %e, "Drain stopped on failed read");
                    break;
                }
            }
        }

        Ok(RawFrame::new(latest))
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Capture one frame, reopening the device after every wait timeout
///
/// Each attempt runs a full open → configure → stream → wait cycle on a fresh
/// handle. Returns the newest frame of the first attempt that did not time
/// out, or the first fatal error. `stop` is checked before every reopen; once
/// raised, the retry loop ends with [`CaptureError::Interrupted`].
pub fn capture_one_frame(
    backend: &dyn CameraBackend,
    request: &CaptureRequest,
    stop: &AtomicBool,
) -> Result<RawFrame, CaptureError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        if attempt > 1 && stop.load(Ordering::SeqCst) {
            info!(attempt, "Stop requested, abandoning frame retries");
            return Err(CaptureError::Interrupted);
        }

        let mut session = CaptureSession::open(backend, &request.device_path)?;
        session.configure(request.fourcc, request.size)?;
        session.start_streaming(request.stabilization_delay)?;

        match session.wait_for_frame(request.frame_timeout)? {
            FrameWait::Ready => {
                let frame = session.read_latest()?;
                debug!(attempt, len = frame.len(), "Frame captured");
                return Ok(frame);
            }
            FrameWait::TimedOut => {
                session.close();
                warn!(
                    device_path = %request.device_path,
                    attempt,
                    timeout_s = request.frame_timeout.as_secs_f32(),
                    "Timed out waiting for frame, reopening device"
                );
            }
        }
    }
}
