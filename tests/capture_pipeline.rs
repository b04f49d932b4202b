// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the negotiate → capture → encode → write path

use framegrab::backends::camera::testing::{CycleScript, DeviceEvent, ScriptedBackend};
use framegrab::backends::camera::{
    BackendError, CaptureSession, FourCc, FrameSize, PixelFormatDescriptor, negotiate_format,
    sorted_frame_sizes,
};
use framegrab::config::{CaptureConfig, CaptureSettings};
use framegrab::errors::{AppError, CaptureError, FormatError};
use framegrab::media::SubsampleRatio;
use framegrab::pipelines::timelapse::{CaptureScheduler, ManualClock};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn yuyv_frame(width: u32, height: u32, fill: u8) -> Vec<u8> {
    vec![fill; (width * height * 2) as usize]
}

fn settings(dir: &std::path::Path) -> CaptureSettings {
    CaptureSettings {
        output_dir: dir.to_path_buf(),
        stabilization_ms: 0,
        ..Default::default()
    }
}

#[test]
fn test_negotiated_format_drives_capture_run() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![
        // Setup session
        CycleScript::default(),
        // Frame 0: stale frame drained, newest kept
        CycleScript::frames(vec![Ok(yuyv_frame(4, 2, 16)), Ok(yuyv_frame(4, 2, 235))]),
        // Frame 1: first cycle times out, second delivers
        CycleScript::timeout(),
        CycleScript::frames(vec![Ok(yuyv_frame(4, 2, 128))]),
    ])
    .with_formats(vec![
        PixelFormatDescriptor::new(FourCc::new(b"MJPG"), "Motion-JPEG"),
        PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2"),
    ])
    .with_sizes(vec![FrameSize::new(8, 4), FrameSize::new(4, 2)]);

    let (format, size) = {
        let mut setup = CaptureSession::open(&backend, "/dev/video0").unwrap();
        let format = negotiate_format(setup.device().unwrap(), "YUYV").unwrap();
        let sizes = sorted_frame_sizes(setup.device().unwrap(), format.descriptor.fourcc).unwrap();
        setup.configure(format.descriptor.fourcc, sizes[0]).unwrap();
        (format, sizes[0])
    };
    assert_eq!(format.subsampling, Some(SubsampleRatio::Ratio422));
    assert_eq!(size, FrameSize::new(4, 2));

    let config = CaptureConfig::new(
        &settings(dir.path()),
        "/dev/video0",
        format,
        size,
        Duration::from_secs(1),
        Some(2),
    );
    let clock = ManualClock::new();
    let written = CaptureScheduler::with_clock(&backend, &config, &clock)
        .run(&AtomicBool::new(false))
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(backend.remaining_cycles(), 0);
    assert_eq!(backend.opens(), 4);
    assert_eq!(backend.count(&DeviceEvent::Close), 4);
    // The format is applied on every open, including the setup session
    assert_eq!(
        backend.count(&DeviceEvent::SetFormat(FourCc::new(b"YUYV"), 4, 2)),
        4
    );

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);

    let first = image::open(&names[0]).unwrap().to_rgb8();
    assert_eq!(first.dimensions(), (4, 2));
    // The drained (bright) frame was kept, not the stale dark one
    assert!(first.get_pixel(0, 0).0[0] > 200);
}

#[test]
fn test_open_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![CycleScript::open_error(
        BackendError::DeviceNotFound("/dev/video9".to_string()),
    )]);
    let format = framegrab::backends::camera::NegotiatedFormat {
        descriptor: PixelFormatDescriptor::new(FourCc::new(b"YUYV"), "YUYV 4:2:2"),
        subsampling: Some(SubsampleRatio::Ratio422),
    };
    let config = CaptureConfig::new(
        &settings(dir.path()),
        "/dev/video9",
        format,
        FrameSize::new(4, 2),
        Duration::from_secs(1),
        None,
    );

    let err = CaptureScheduler::with_clock(&backend, &config, ManualClock::new())
        .run(&AtomicBool::new(false))
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Capture(CaptureError::Open(BackendError::DeviceNotFound(_)))
    ));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_missing_family_reported_before_capture() {
    let backend = ScriptedBackend::new(vec![CycleScript::default()]).with_formats(vec![
        PixelFormatDescriptor::new(FourCc::new(b"MJPG"), "Motion-JPEG"),
    ]);

    let setup = CaptureSession::open(&backend, "/dev/video0").unwrap();
    let err = negotiate_format(setup.device().unwrap(), "YUYV").unwrap_err();
    assert_eq!(err, FormatError::NoMatchingFormat("YUYV".to_string()));
    assert_eq!(err.to_string(), "No YUYV format found");

    drop(setup);
    assert_eq!(backend.count(&DeviceEvent::Close), 1);
}
