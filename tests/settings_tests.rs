// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for persisted capture settings

use framegrab::CaptureSettings;
use framegrab::backends::camera::FrameSize;
use std::path::PathBuf;

#[test]
fn test_settings_file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("framegrab").join("settings.json");

    let settings = CaptureSettings {
        device: Some("/dev/video1".to_string()),
        width: Some(1280),
        height: Some(720),
        interval_secs: Some(30.0),
        output_dir: PathBuf::from("/tmp/frames"),
        jpeg_quality: 85,
        ..Default::default()
    };
    settings.save(&path).unwrap();

    let loaded = CaptureSettings::load(&path).unwrap();
    assert_eq!(loaded.size(), Some(FrameSize::new(1280, 720)));
    assert_eq!(loaded.jpeg_quality, 85);
    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_file_is_readable_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    CaptureSettings::default().save(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    // Sensible defaults
    assert_eq!(value["format"], "YUYV");
    assert_eq!(value["jpeg_quality"], 100);
    assert_eq!(value["frame_timeout_secs"], 5);
    assert!(value["device"].is_null());
}

#[test]
fn test_missing_settings_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CaptureSettings::load(&dir.path().join("absent.json")).is_err());
}
