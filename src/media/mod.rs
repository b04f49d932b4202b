// SPDX-License-Identifier: GPL-3.0-only

//! Media processing utilities
//!
//! The [`planar`] module describes chroma-subsampled planar images: plane
//! sizes and strides per subsampling ratio, sample offsets, and conversion
//! to RGB for encoding.

pub mod planar;

pub use planar::{PlanarImage, SubsampleRatio};
