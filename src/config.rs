// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CaptureRequest, FrameSize, NegotiatedFormat};
use crate::constants::{DEFAULT_JPEG_QUALITY, YUYV_FAMILY, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Persisted capture settings
///
/// Every field is optional in the JSON file; anything left unset is either
/// defaulted or asked for interactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Device path (e.g. "/dev/video0")
    pub device: Option<String>,
    /// Four-character label prefix of the pixel format family
    pub format: String,
    /// Frame width
    pub width: Option<u32>,
    /// Frame height
    pub height: Option<u32>,
    /// Seconds between capture slots
    pub interval_secs: Option<f64>,
    /// Directory receiving the frame files
    pub output_dir: PathBuf,
    /// JPEG quality for reassembled frames (1-100)
    pub jpeg_quality: u8,
    /// Seconds to wait for a frame before reopening the device
    pub frame_timeout_secs: u64,
    /// Milliseconds to let the stream settle after it starts
    pub stabilization_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: None,
            format: YUYV_FAMILY.to_string(),
            width: None,
            height: None,
            interval_secs: None,
            output_dir: PathBuf::from("."),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            frame_timeout_secs: timing::FRAME_TIMEOUT.as_secs(),
            stabilization_ms: timing::STABILIZATION_DELAY.as_millis() as u64,
        }
    }
}

impl CaptureSettings {
    /// Default settings file, `$XDG_CONFIG_HOME/framegrab/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("framegrab").join("settings.json"))
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let settings: Self = serde_json::from_str(&text)?;
        debug!(path = %path.display(), ?settings, "Loaded capture settings");
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Saved capture settings");
        Ok(())
    }

    /// Frame size, when both dimensions are set
    pub fn size(&self) -> Option<FrameSize> {
        Some(FrameSize::new(self.width?, self.height?))
    }

    /// Capture interval, `None` when unset
    ///
    /// Negative, non-finite or out-of-range values are rejected.
    pub fn interval(&self) -> AppResult<Option<Duration>> {
        self.interval_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| AppError::Config(format!("interval {}s: {}", secs, e)))
            })
            .transpose()
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_secs(self.frame_timeout_secs)
    }

    pub fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_ms)
    }
}

/// Resolved, immutable configuration of one capture run
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Device, format and size re-applied on every reopen
    pub request: CaptureRequest,
    pub format: NegotiatedFormat,
    pub interval: Duration,
    pub output_dir: PathBuf,
    pub jpeg_quality: u8,
    /// Stop after this many frames; `None` runs until interrupted
    pub max_frames: Option<u64>,
}

impl CaptureConfig {
    /// Combine negotiated device state with user settings
    pub fn new(
        settings: &CaptureSettings,
        device_path: &str,
        format: NegotiatedFormat,
        size: FrameSize,
        interval: Duration,
        max_frames: Option<u64>,
    ) -> Self {
        let mut request = CaptureRequest::new(device_path, format.descriptor.fourcc, size);
        request.frame_timeout = settings.frame_timeout();
        request.stabilization_delay = settings.stabilization_delay();

        Self {
            request,
            format,
            interval,
            output_dir: settings.output_dir.clone(),
            jpeg_quality: settings.jpeg_quality,
            max_frames,
        }
    }

    pub fn size(&self) -> FrameSize {
        self.request.size
    }
}
