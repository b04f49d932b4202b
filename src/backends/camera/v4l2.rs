// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device binding
//!
//! Implements [`CameraBackend`] and [`CaptureDevice`] on top of the `v4l`
//! crate using memory-mapped streaming. Waiting for a frame polls the device
//! descriptor so a timeout can be told apart from a failed dequeue;
//! reads dequeue without blocking and copy the used part of the buffer.

use super::types::{
    AppliedFormat, BackendError, BackendResult, FourCc, FrameSize, PixelFormatDescriptor,
};
use super::{CameraBackend, CaptureDevice};
use crate::constants::STREAM_BUFFER_COUNT;
use std::time::Duration;
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::framesize::FrameSizeEnum;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream as _};
use v4l::Device;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Backend that opens `/dev/video*` nodes
#[derive(Debug, Clone)]
pub struct V4l2Backend {
    buffer_count: u32,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self {
            buffer_count: STREAM_BUFFER_COUNT,
        }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn open(&self, path: &str) -> BackendResult<Box<dyn CaptureDevice>> {
        let device = Device::with_path(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            _ => BackendError::OpenFailed(format!("{}: {}", path, e)),
        })?;

        Ok(Box::new(V4l2Device {
            stream: None,
            device,
            path: path.to_string(),
            buffer_count: self.buffer_count,
        }))
    }
}

/// An open V4L2 capture node
///
/// `stream` is declared before `device` so buffers are unmapped and the
/// stream switched off before the descriptor is closed.
pub struct V4l2Device {
    stream: Option<MmapStream<'static>>,
    device: Device,
    path: String,
    buffer_count: u32,
}

fn to_v4l(fourcc: FourCc) -> FourCC {
    FourCC::new(&fourcc.0)
}

fn from_v4l(fourcc: FourCC) -> FourCc {
    FourCc(fourcc.repr)
}

impl V4l2Device {
    fn stream_mut(&mut self) -> BackendResult<&mut MmapStream<'static>> {
        self.stream
            .as_mut()
            .ok_or_else(|| BackendError::StreamingFailed("stream not started".to_string()))
    }
}

impl CaptureDevice for V4l2Device {
    fn supported_formats(&self) -> BackendResult<Vec<PixelFormatDescriptor>> {
        let formats = self.device.enum_formats()?;
        Ok(formats
            .into_iter()
            .map(|desc| PixelFormatDescriptor::new(from_v4l(desc.fourcc), desc.description))
            .collect())
    }

    fn supported_sizes(&self, fourcc: FourCc) -> BackendResult<Vec<FrameSize>> {
        let mut sizes: Vec<FrameSize> = Vec::new();
        for size in self.device.enum_framesizes(to_v4l(fourcc))? {
            let size = match size.size {
                FrameSizeEnum::Discrete(discrete) => {
                    FrameSize::new(discrete.width, discrete.height)
                }
                FrameSizeEnum::Stepwise(step) => FrameSize::new(step.max_width, step.max_height),
            };
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
        Ok(sizes)
    }

    fn set_format(
        &mut self,
        fourcc: FourCc,
        width: u32,
        height: u32,
    ) -> BackendResult<AppliedFormat> {
        let requested = Format::new(width, height, to_v4l(fourcc));
        let applied = self
            .device
            .set_format(&requested)
            .map_err(|e| BackendError::FormatNotSupported(format!("{}: {}", requested, e)))?;

        debug!(path = %self.path, format = %applied, "Format applied");
        Ok(AppliedFormat {
            fourcc: from_v4l(applied.fourcc),
            width: applied.width,
            height: applied.height,
        })
    }

    fn start_streaming(&mut self) -> BackendResult<()> {
        let mut stream = MmapStream::with_buffers(&self.device, Type::VideoCapture, self.buffer_count)
            .map_err(|e| BackendError::StreamingFailed(format!("buffer setup: {}", e)))?;

        // The first `next()` on an active stream queues buffer 0 itself, so
        // only the others are handed to the driver before STREAMON.
        for index in 1..self.buffer_count as usize {
            stream
                .queue(index)
                .map_err(|e| BackendError::StreamingFailed(format!("queue buffer {}: {}", index, e)))?;
        }
        stream
            .start()
            .map_err(|e| BackendError::StreamingFailed(format!("STREAMON: {}", e)))?;

        info!(path = %self.path, buffers = self.buffer_count, "V4L2 stream started");
        self.stream = Some(stream);
        Ok(())
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> BackendResult<()> {
        self.stream_mut()?;

        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        match self.device.handle().poll(libc::POLLIN, timeout_ms) {
            Ok(0) => Err(BackendError::Timeout),
            Ok(_) => Ok(()),
            Err(e) => Err(BackendError::IoError(format!("poll: {}", e))),
        }
    }

    fn read_frame(&mut self) -> BackendResult<Vec<u8>> {
        let stream = self.stream_mut()?;
        stream.set_timeout(Duration::ZERO);

        let (buf, meta) = CaptureStream::next(stream)?;
        let used = (meta.bytesused as usize).min(buf.len());
        Ok(buf[..used].to_vec())
    }
}

impl Drop for V4l2Device {
    fn drop(&mut self) {
        debug!(path = %self.path, streaming = self.stream.is_some(), "Closing V4L2 device");
    }
}
