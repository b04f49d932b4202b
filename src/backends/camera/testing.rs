// SPDX-License-Identifier: GPL-3.0-only

//! Scripted camera backend for tests
//!
//! [`ScriptedBackend`] hands out one [`ScriptedDevice`] per `open` call, each
//! driven by the next [`CycleScript`] in its queue. Every device call is
//! recorded as a [`DeviceEvent`] in a log shared by all handles, including
//! the close that happens when a handle is dropped.

use super::types::{
    AppliedFormat, BackendError, BackendResult, FourCc, FrameSize, PixelFormatDescriptor,
};
use super::{CameraBackend, CaptureDevice};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Initialise a tracing subscriber for tests.
///
/// Respects `RUST_LOG`, defaults to `debug`. Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A device call observed by the scripted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Open(String),
    SetFormat(FourCc, u32, u32),
    StartStreaming,
    WaitForFrame,
    ReadFrame,
    Close,
}

/// Behaviour of one open → close cycle
#[derive(Debug, Clone, Default)]
pub struct CycleScript {
    pub open: Option<BackendError>,
    pub set_format: Option<BackendError>,
    pub start_streaming: Option<BackendError>,
    pub wait: Option<BackendError>,
    /// Results returned by successive `read_frame` calls; an exhausted
    /// queue reads as "no frame ready"
    pub reads: VecDeque<BackendResult<Vec<u8>>>,
}

impl CycleScript {
    /// A cycle whose wait succeeds and whose reads return `reads` in order
    pub fn frames(reads: Vec<BackendResult<Vec<u8>>>) -> Self {
        Self {
            reads: reads.into(),
            ..Default::default()
        }
    }

    /// A cycle whose wait times out
    pub fn timeout() -> Self {
        Self {
            wait: Some(BackendError::Timeout),
            ..Default::default()
        }
    }

    /// A cycle whose open fails
    pub fn open_error(err: BackendError) -> Self {
        Self {
            open: Some(err),
            ..Default::default()
        }
    }
}

type EventLog = Arc<Mutex<Vec<DeviceEvent>>>;

fn record(log: &EventLog, event: DeviceEvent) {
    if let Ok(mut events) = log.lock() {
        events.push(event);
    }
}

/// Backend that replays scripted cycles
pub struct ScriptedBackend {
    cycles: Mutex<VecDeque<CycleScript>>,
    formats: Vec<PixelFormatDescriptor>,
    sizes: Vec<FrameSize>,
    log: EventLog,
    stop_on_open: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedBackend {
    pub fn new(cycles: Vec<CycleScript>) -> Self {
        Self {
            cycles: Mutex::new(cycles.into()),
            formats: vec![PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2")],
            sizes: vec![FrameSize::new(640, 480)],
            log: EventLog::default(),
            stop_on_open: None,
        }
    }

    /// Raise `flag` when the `nth` successful open (1-based) happens
    pub fn stop_on_open(mut self, nth: usize, flag: Arc<AtomicBool>) -> Self {
        self.stop_on_open = Some((nth, flag));
        self
    }

    pub fn with_formats(mut self, formats: Vec<PixelFormatDescriptor>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_sizes(mut self, sizes: Vec<FrameSize>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Snapshot of every recorded call
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.log.lock().map(|e| e.to_vec()).unwrap_or_default()
    }

    /// Number of recorded calls equal to `event`
    pub fn count(&self, event: &DeviceEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Number of opens that succeeded
    pub fn opens(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, DeviceEvent::Open(_)))
            .count()
    }

    /// Cycles not yet consumed
    pub fn remaining_cycles(&self) -> usize {
        self.cycles.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl CameraBackend for ScriptedBackend {
    fn open(&self, path: &str) -> BackendResult<Box<dyn CaptureDevice>> {
        let mut cycle = self
            .cycles
            .lock()
            .ok()
            .and_then(|mut c| c.pop_front())
            .ok_or_else(|| BackendError::OpenFailed(format!("{}: script exhausted", path)))?;

        if let Some(err) = cycle.open.take() {
            return Err(err);
        }

        record(&self.log, DeviceEvent::Open(path.to_string()));
        if let Some((nth, flag)) = &self.stop_on_open
            && self.opens() == *nth
        {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(Box::new(ScriptedDevice {
            formats: self.formats.clone(),
            sizes: self.sizes.clone(),
            cycle,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Device handle driven by a [`CycleScript`]
#[derive(Default)]
pub struct ScriptedDevice {
    formats: Vec<PixelFormatDescriptor>,
    sizes: Vec<FrameSize>,
    cycle: CycleScript,
    log: EventLog,
}

impl ScriptedDevice {
    pub fn with_formats(mut self, formats: Vec<PixelFormatDescriptor>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_sizes(mut self, sizes: Vec<FrameSize>) -> Self {
        self.sizes = sizes;
        self
    }
}

impl CaptureDevice for ScriptedDevice {
    fn supported_formats(&self) -> BackendResult<Vec<PixelFormatDescriptor>> {
        Ok(self.formats.clone())
    }

    fn supported_sizes(&self, _fourcc: FourCc) -> BackendResult<Vec<FrameSize>> {
        Ok(self.sizes.clone())
    }

    fn set_format(
        &mut self,
        fourcc: FourCc,
        width: u32,
        height: u32,
    ) -> BackendResult<AppliedFormat> {
        record(&self.log, DeviceEvent::SetFormat(fourcc, width, height));
        match self.cycle.set_format.take() {
            Some(err) => Err(err),
            None => Ok(AppliedFormat {
                fourcc,
                width,
                height,
            }),
        }
    }

    fn start_streaming(&mut self) -> BackendResult<()> {
        record(&self.log, DeviceEvent::StartStreaming);
        self.cycle.start_streaming.take().map_or(Ok(()), Err)
    }

    fn wait_for_frame(&mut self, _timeout: Duration) -> BackendResult<()> {
        record(&self.log, DeviceEvent::WaitForFrame);
        self.cycle.wait.take().map_or(Ok(()), Err)
    }

    fn read_frame(&mut self) -> BackendResult<Vec<u8>> {
        record(&self.log, DeviceEvent::ReadFrame);
        self.cycle
            .reads
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::IoError("no frame ready".to_string())))
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        record(&self.log, DeviceEvent::Close);
    }
}
