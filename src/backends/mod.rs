// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! # Modules
//!
//! - [`camera`]: Device binding, capability negotiation, capture sessions and
//!   raw frame conversion

pub mod camera;
