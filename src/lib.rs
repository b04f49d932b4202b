// SPDX-License-Identifier: GPL-3.0-only

//! framegrab - time-lapse still capture for V4L2 cameras
//!
//! Captures a frame from a video device at a fixed interval, reassembles
//! interleaved YUYV data into a planar image, and writes each frame as a
//! timestamped JPEG.
//!
//! # Architecture
//!
//! - [`backends`]: Device abstraction, capability negotiation and capture sessions
//! - [`media`]: Planar image layout and color conversion
//! - [`pipelines`]: Frame encoding and the time-lapse scheduler
//! - [`config`]: Persisted settings and the resolved run configuration
//! - [`storage`]: Output file naming and writing
//! - [`prompt`]: Interactive terminal menus
//!
//! # Example
//!
//! ```ignore
//! // Interactive capture from the terminal:
//! // framegrab capture --interval 10 --output ./frames
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod prompt;
pub mod storage;

// Re-export commonly used types
pub use config::{CaptureConfig, CaptureSettings};
pub use errors::{AppError, AppResult};
