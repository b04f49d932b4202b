// SPDX-License-Identifier: GPL-3.0-only

//! Time-lapse capture loop
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌───────────────┐   ┌──────────┐
//! │ capture one  │──▶│ PhotoPipeline │──▶│ write_frame   │──▶│  pace    │──┐
//! │ frame (cycle)│   │ encode/pass   │   │ Frame-N--...  │   │ to slot  │  │
//! └──────────────┘   └───────────────┘   └───────────────┘   └──────────┘  │
//!        ▲                                                                 │
//!        └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every iteration runs a full device session on the calling thread. The
//! stop flag is checked between iterations and between the reopen attempts
//! that follow a frame-wait timeout. A frame that was captured is always
//! processed and written.

pub mod pacing;

pub use pacing::{Clock, ManualClock, Pacer, SystemClock};

use crate::backends::camera::{CameraBackend, capture_one_frame};
use crate::config::CaptureConfig;
use crate::errors::{AppError, AppResult, CaptureError};
use crate::pipelines::photo::{PhotoEncoder, PhotoPipeline};
use crate::storage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// A frame that reached disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFrame {
    pub index: u64,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Drives repeated capture cycles at a fixed cadence
pub struct CaptureScheduler<'a, C: Clock> {
    backend: &'a dyn CameraBackend,
    config: &'a CaptureConfig,
    pipeline: PhotoPipeline,
    pacer: Pacer,
    clock: C,
}

impl<'a> CaptureScheduler<'a, SystemClock> {
    /// Scheduler on the wall clock, anchored now
    pub fn new(backend: &'a dyn CameraBackend, config: &'a CaptureConfig) -> Self {
        Self::with_clock(backend, config, SystemClock::start())
    }
}

impl<'a, C: Clock> CaptureScheduler<'a, C> {
    pub fn with_clock(
        backend: &'a dyn CameraBackend,
        config: &'a CaptureConfig,
        clock: C,
    ) -> Self {
        Self {
            backend,
            config,
            pipeline: PhotoPipeline::new(PhotoEncoder::with_quality(config.jpeg_quality)),
            pacer: Pacer::new(config.interval),
            clock,
        }
    }

    /// Run until `stop` is raised, the frame limit is reached, or a fatal
    /// error occurs. Returns the number of frames written.
    pub fn run(&self, stop: &AtomicBool) -> AppResult<u64> {
        self.run_with(stop, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_saved` after each frame is written
    pub fn run_with(
        &self,
        stop: &AtomicBool,
        mut on_saved: impl FnMut(&SavedFrame),
    ) -> AppResult<u64> {
        storage::ensure_output_dir(&self.config.output_dir)?;

        info!(
            device_path = %self.config.request.device_path,
            format = %self.config.format.descriptor,
            size = %self.config.size(),
            interval_ms = self.pacer.interval().as_millis() as u64,
            max_frames = ?self.config.max_frames,
            "Starting time-lapse capture"
        );

        let mut index: u64 = 0;
        while !self.limit_reached(index) {
            if stop.load(Ordering::SeqCst) {
                info!(frames = index, "Stop requested");
                break;
            }

            let saved = match self.capture_frame(index, stop) {
                Err(AppError::Capture(CaptureError::Interrupted)) => {
                    info!(frames = index, "Stop requested while retrying capture");
                    break;
                }
                result => result?,
            };
            on_saved(&saved);
            index += 1;

            if self.limit_reached(index) {
                break;
            }
            if !self.pacer.wait_for_slot(&self.clock, index, stop) {
                info!(frames = index, "Stop requested while waiting for next slot");
                break;
            }
        }

        info!(frames = index, "Time-lapse capture finished");
        Ok(index)
    }

    fn limit_reached(&self, index: u64) -> bool {
        self.config.max_frames.is_some_and(|max| index >= max)
    }

    fn capture_frame(&self, index: u64, stop: &AtomicBool) -> AppResult<SavedFrame> {
        let frame = capture_one_frame(self.backend, &self.config.request, stop)?;
        let captured_at = frame.captured_at;
        debug!(index, bytes = frame.len(), "Frame captured");

        let output = self
            .pipeline
            .process(frame, &self.config.format, self.config.size())?;
        let path = storage::write_frame(&self.config.output_dir, index, output.bytes())?;

        info!(
            index,
            path = %path.display(),
            write_ms = captured_at.elapsed().as_millis() as u64,
            "Photo taken"
        );
        Ok(SavedFrame {
            index,
            path,
            bytes: output.bytes().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::testing::{CycleScript, DeviceEvent, ScriptedBackend};
    use crate::backends::camera::{FourCc, FrameSize, NegotiatedFormat, PixelFormatDescriptor};
    use crate::config::CaptureSettings;
    use crate::errors::{AppError, CaptureError};
    use crate::media::planar::SubsampleRatio;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    const W: u32 = 8;
    const H: u32 = 4;

    fn config(dir: &Path, format: NegotiatedFormat, max_frames: Option<u64>) -> CaptureConfig {
        let settings = CaptureSettings {
            output_dir: dir.to_path_buf(),
            stabilization_ms: 0,
            ..Default::default()
        };
        CaptureConfig::new(
            &settings,
            "/dev/video0",
            format,
            FrameSize::new(W, H),
            Duration::from_secs(2),
            max_frames,
        )
    }

    fn yuyv() -> NegotiatedFormat {
        NegotiatedFormat {
            descriptor: PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2"),
            subsampling: Some(SubsampleRatio::Ratio422),
        }
    }

    fn frame() -> Vec<u8> {
        vec![128; (W * H * 2) as usize]
    }

    fn files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_numbered_jpegs_on_schedule() {
        crate::backends::camera::testing::init_test_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), yuyv(), Some(3));
        let backend = ScriptedBackend::new(vec![
            CycleScript::frames(vec![Ok(frame())]),
            CycleScript::timeout(),
            CycleScript::frames(vec![Ok(frame())]),
            CycleScript::frames(vec![Ok(frame())]),
        ]);
        let clock = ManualClock::new();

        let mut seen = Vec::new();
        let written = CaptureScheduler::with_clock(&backend, &config, &clock)
            .run_with(&AtomicBool::new(false), |saved| seen.push(saved.index))
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(backend.opens(), 4);
        assert_eq!(backend.count(&DeviceEvent::Close), 4);
        // Two pacing waits, to the 2s and 4s slots
        assert_eq!(clock.elapsed(), Duration::from_secs(4));

        let names = files(dir.path());
        assert_eq!(names.len(), 3);
        for (i, name) in names.iter().enumerate() {
            assert!(name.starts_with(&format!("Frame-{:08}--", i)), "{}", name);
            let data = std::fs::read(dir.path().join(name)).unwrap();
            assert_eq!(&data[..2], &[0xFF, 0xD8]);
        }
    }

    #[test]
    fn test_pass_through_writes_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let format = NegotiatedFormat {
            descriptor: PixelFormatDescriptor::new(FourCc::new(b"MJPG"), "Motion-JPEG"),
            subsampling: None,
        };
        let config = config(dir.path(), format, Some(1));
        let backend = ScriptedBackend::new(vec![CycleScript::frames(vec![Ok(vec![9, 8, 7])])]);

        let written = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
            .run(&AtomicBool::new(false))
            .unwrap();

        assert_eq!(written, 1);
        let names = files(dir.path());
        assert_eq!(std::fs::read(dir.path().join(&names[0])).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_fatal_capture_error_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), yuyv(), None);
        let backend = ScriptedBackend::new(vec![
            CycleScript::frames(vec![Ok(frame())]),
            CycleScript::frames(vec![Ok(Vec::new())]),
        ]);

        let err = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
            .run(&AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, AppError::Capture(CaptureError::EmptyFrame)));
        assert_eq!(files(dir.path()).len(), 1);
        assert_eq!(backend.count(&DeviceEvent::Close), 2);
    }

    #[test]
    fn test_length_mismatch_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), yuyv(), None);
        let backend = ScriptedBackend::new(vec![CycleScript::frames(vec![Ok(vec![0; 5])])]);

        let err = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
            .run(&AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, AppError::Reassembly(_)));
        assert!(files(dir.path()).is_empty());
    }

    #[test]
    fn test_stop_while_device_times_out_ends_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), yuyv(), None);
        let stop = Arc::new(AtomicBool::new(false));
        let backend = ScriptedBackend::new(vec![
            CycleScript::frames(vec![Ok(frame())]),
            CycleScript::timeout(),
            CycleScript::timeout(),
            CycleScript::frames(vec![Ok(frame())]),
        ])
        .stop_on_open(2, Arc::clone(&stop));

        let written = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
            .run(&stop)
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(files(dir.path()).len(), 1);
        assert_eq!(backend.opens(), 2);
        assert_eq!(backend.count(&DeviceEvent::Close), 2);
        assert_eq!(backend.remaining_cycles(), 2);
    }

    #[test]
    fn test_stop_before_start_captures_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), yuyv(), None);
        let backend = ScriptedBackend::new(Vec::new());

        let written = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
            .run(&AtomicBool::new(true))
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(backend.opens(), 0);
    }
}
