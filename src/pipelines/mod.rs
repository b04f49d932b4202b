// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured frames
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Raw Frame   │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG File   │
//! │   (YUYV)     │     │  - YUYV→planar    │     │              │
//! │              │     │  - JPEG encoding  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!        ▲
//!        │ one capture cycle per slot
//! ┌──────────────┐
//! │  Time-lapse  │  fixed cadence anchored at the run start
//! │  Scheduler   │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Reassembly and JPEG encoding, or raw pass-through
//! - [`timelapse`]: Capture loop and pacing

pub mod photo;
pub mod timelapse;
