// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing video devices
//! - Interactive setup followed by a time-lapse capture run

use framegrab::backends::camera::v4l2_utils::enumerate_video_devices;
use framegrab::backends::camera::{
    CameraBackend, CaptureSession, FrameSize, V4l2Backend, negotiate_format, sorted_frame_sizes,
};
use framegrab::config::{CaptureConfig, CaptureSettings};
use framegrab::errors::FormatError;
use framegrab::pipelines::timelapse::CaptureScheduler;
use framegrab::prompt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Command-line overrides for a capture run
#[derive(Debug, Default)]
pub struct CaptureOptions {
    pub config: Option<PathBuf>,
    pub save_config: bool,
    pub device: Option<String>,
    pub format: Option<String>,
    pub size: Option<FrameSize>,
    pub interval: Option<f64>,
    pub output: Option<PathBuf>,
    pub quality: Option<u8>,
    pub frames: Option<u64>,
}

/// List all video devices with their formats
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = enumerate_video_devices()?;

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let backend = V4l2Backend::new();
    println!("Available cameras:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        let name = if device.card.is_empty() {
            "unknown"
        } else {
            device.card.as_str()
        };
        println!("  [{}] {} - {} ({})", index + 1, device.path, name, device.driver);

        let formats = backend
            .open(&device.path)
            .and_then(|dev| dev.supported_formats())
            .unwrap_or_default();
        if !formats.is_empty() {
            let labels: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
            println!("      Formats: {}", labels.join(", "));
        }
        println!();
    }

    Ok(())
}

fn load_settings(options: &CaptureOptions) -> Result<CaptureSettings, Box<dyn std::error::Error>> {
    if let Some(path) = &options.config {
        return Ok(CaptureSettings::load(path)?);
    }
    match CaptureSettings::default_path() {
        Some(path) if path.exists() => Ok(CaptureSettings::load(&path)?),
        _ => Ok(CaptureSettings::default()),
    }
}

fn apply_overrides(settings: &mut CaptureSettings, options: &CaptureOptions) {
    if let Some(device) = &options.device {
        settings.device = Some(device.clone());
    }
    if let Some(format) = &options.format {
        settings.format = format.clone();
    }
    if let Some(size) = options.size {
        settings.width = Some(size.max_width);
        settings.height = Some(size.max_height);
    }
    if let Some(interval) = options.interval {
        settings.interval_secs = Some(interval);
    }
    if let Some(output) = &options.output {
        settings.output_dir = output.clone();
    }
    if let Some(quality) = options.quality {
        settings.jpeg_quality = quality;
    }
}

/// Resolve the device path, asking when it is not configured
fn select_device<R: BufRead, W: Write>(
    settings: &CaptureSettings,
    input: &mut R,
    output: &mut W,
) -> Result<(String, bool), Box<dyn std::error::Error>> {
    if let Some(device) = &settings.device {
        return Ok((device.clone(), false));
    }

    let devices = enumerate_video_devices()?;
    let labels: Vec<String> = devices
        .iter()
        .map(|d| {
            if d.card.is_empty() {
                d.path.clone()
            } else {
                format!("{} ({})", d.path, d.card)
            }
        })
        .collect();
    let index = prompt::choose(input, output, "camera", &labels)?;
    Ok((devices[index].path.clone(), true))
}

/// Interactive setup, then capture until Ctrl+C or the frame limit
pub fn run_capture(options: CaptureOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load_settings(&options)?;
    apply_overrides(&mut settings, &options);
    let configured_interval = settings.interval()?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stderr();

    let (device_path, mut prompted) = select_device(&settings, &mut input, &mut output)?;
    settings.device = Some(device_path.clone());
    println!("Using camera: {}", device_path);

    let backend = V4l2Backend::new();

    // Negotiate and apply the format once up front; the session is closed
    // again before the first capture cycle opens the device.
    let (format, size) = {
        let mut setup = CaptureSession::open(&backend, &device_path)?;
        let format = negotiate_format(setup.device()?, &settings.format)?;
        let fourcc = format.descriptor.fourcc;
        let sizes = sorted_frame_sizes(setup.device()?, fourcc)?;

        let size = match settings.size() {
            Some(size) if sizes.contains(&size) => size,
            Some(size) => return Err(FormatError::SizeNotSupported(size.to_string()).into()),
            None => {
                writeln!(output, "Supported frame sizes for format {}", format.descriptor)?;
                let index = prompt::choose(&mut input, &mut output, "format", &sizes)?;
                prompted = true;
                sizes[index]
            }
        };

        let applied = setup.configure(fourcc, size)?;
        writeln!(
            output,
            "Resulting image format: {} ({}) ({}x{})",
            applied.fourcc, format.descriptor.label, applied.width, applied.height
        )?;
        (format, size)
    };
    settings.width = Some(size.max_width);
    settings.height = Some(size.max_height);

    let interval = match configured_interval {
        Some(interval) => interval,
        None => {
            let secs = prompt::read_interval_secs(&mut input, &mut output)?;
            prompted = true;
            settings.interval_secs = Some(secs as f64);
            Duration::from_secs(secs)
        }
    };

    if options.save_config {
        let path = options
            .config
            .clone()
            .or_else(CaptureSettings::default_path)
            .ok_or("No configuration directory available")?;
        settings.save(&path)?;
        println!("Settings saved: {}", path.display());
    }

    if prompted {
        prompt::wait_for_enter(&mut input, &mut output)?;
    }
    drop(input);

    let config = CaptureConfig::new(
        &settings,
        &device_path,
        format,
        size,
        interval,
        options.frames,
    );

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Capturing every {:.1}s (press Ctrl+C to stop)", interval.as_secs_f64());
    let written = CaptureScheduler::new(&backend, &config).run_with(&stop_flag, |saved| {
        println!("Frame {} saved: {}", saved.index, saved.path.display());
    })?;

    println!("{} frames captured.", written);
    Ok(())
}
