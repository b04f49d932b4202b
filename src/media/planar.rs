// SPDX-License-Identifier: GPL-3.0-only

//! Planar YCbCr images
//!
//! A [`PlanarImage`] stores luma and the two chroma channels as separate
//! contiguous planes. Chroma plane dimensions depend on the [`SubsampleRatio`]:
//!
//! | ratio | chroma width | chroma height |
//! |-------|--------------|---------------|
//! | 4:4:4 | w            | h             |
//! | 4:2:2 | ⌈w/2⌉        | h             |
//! | 4:2:0 | ⌈w/2⌉        | ⌈h/2⌉         |
//! | 4:4:0 | w            | ⌈h/2⌉         |
//! | 4:1:1 | ⌈w/4⌉        | h             |
//! | 4:1:0 | ⌈w/4⌉        | ⌈h/2⌉         |

use image::RgbImage;

/// Chroma subsampling ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsampleRatio {
    Ratio410,
    Ratio411,
    Ratio420,
    Ratio422,
    Ratio440,
    Ratio444,
}

impl SubsampleRatio {
    pub const ALL: [SubsampleRatio; 6] = [
        SubsampleRatio::Ratio410,
        SubsampleRatio::Ratio411,
        SubsampleRatio::Ratio420,
        SubsampleRatio::Ratio422,
        SubsampleRatio::Ratio440,
        SubsampleRatio::Ratio444,
    ];

    /// Canonical `J:a:b` notation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsampleRatio::Ratio410 => "4:1:0",
            SubsampleRatio::Ratio411 => "4:1:1",
            SubsampleRatio::Ratio420 => "4:2:0",
            SubsampleRatio::Ratio422 => "4:2:2",
            SubsampleRatio::Ratio440 => "4:4:0",
            SubsampleRatio::Ratio444 => "4:4:4",
        }
    }

    /// Parse an exact ratio token such as `"4:2:2"`
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == token)
    }

    /// Derive the ratio from a driver format label's trailing token
    ///
    /// `"YUYV 4:2:2"` yields `Ratio422`. Labels whose last five characters are
    /// not one of the six canonical ratios yield `Err` with the offending suffix.
    pub fn from_label(label: &str) -> Result<Self, String> {
        let suffix = label
            .char_indices()
            .rev()
            .nth(4)
            .map(|(idx, _)| &label[idx..])
            .unwrap_or(label);
        Self::from_token(suffix).ok_or_else(|| suffix.to_string())
    }

    /// Chroma plane dimensions for a `width` x `height` frame
    pub fn chroma_dimensions(&self, width: usize, height: usize) -> (usize, usize) {
        let half_w = width.div_ceil(2);
        let quarter_w = width.div_ceil(4);
        let half_h = height.div_ceil(2);
        match self {
            SubsampleRatio::Ratio444 => (width, height),
            SubsampleRatio::Ratio422 => (half_w, height),
            SubsampleRatio::Ratio420 => (half_w, half_h),
            SubsampleRatio::Ratio440 => (width, half_h),
            SubsampleRatio::Ratio411 => (quarter_w, height),
            SubsampleRatio::Ratio410 => (quarter_w, half_h),
        }
    }

    /// Chroma sample (column, row) covering luma pixel (x, y)
    fn chroma_position(&self, x: usize, y: usize) -> (usize, usize) {
        match self {
            SubsampleRatio::Ratio444 => (x, y),
            SubsampleRatio::Ratio422 => (x / 2, y),
            SubsampleRatio::Ratio420 => (x / 2, y / 2),
            SubsampleRatio::Ratio440 => (x, y / 2),
            SubsampleRatio::Ratio411 => (x / 4, y),
            SubsampleRatio::Ratio410 => (x / 4, y / 2),
        }
    }
}

impl std::fmt::Display for SubsampleRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planar luma/chroma image
#[derive(Debug, Clone)]
pub struct PlanarImage {
    pub width: u32,
    pub height: u32,
    pub ratio: SubsampleRatio,
    pub y: Vec<u8>,
    pub cb: Vec<u8>,
    pub cr: Vec<u8>,
    pub y_stride: usize,
    pub c_stride: usize,
}

impl PlanarImage {
    /// Allocate a zeroed image with plane sizes derived from `ratio`
    pub fn new(width: u32, height: u32, ratio: SubsampleRatio) -> Self {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = ratio.chroma_dimensions(w, h);
        Self {
            width,
            height,
            ratio,
            y: vec![0; w * h],
            cb: vec![0; cw * ch],
            cr: vec![0; cw * ch],
            y_stride: w,
            c_stride: cw,
        }
    }

    /// Index into the luma plane for pixel (x, y)
    pub fn y_offset(&self, x: usize, y: usize) -> usize {
        y * self.y_stride + x
    }

    /// Index into the chroma planes for pixel (x, y)
    pub fn c_offset(&self, x: usize, y: usize) -> usize {
        let (cx, cy) = self.ratio.chroma_position(x, y);
        cy * self.c_stride + cx
    }

    /// Convert to interleaved RGB (BT.601 full range)
    pub fn to_rgb(&self) -> RgbImage {
        let mut rgb = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in rgb.enumerate_pixels_mut() {
            let (x, y) = (x as usize, y as usize);
            let luma = self.y[self.y_offset(x, y)] as f32;
            let c = self.c_offset(x, y);
            let u = self.cb[c] as f32 - 128.0;
            let v = self.cr[c] as f32 - 128.0;

            let r = (luma + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (luma - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (luma + 1.772 * u).clamp(0.0, 255.0) as u8;
            *pixel = image::Rgb([r, g, b]);
        }
        rgb
    }
}
