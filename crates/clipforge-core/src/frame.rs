//! CPU frame buffers and the source-over blend used by every compositing path.
//!
//! Frames are packed RGBA8 with straight (non-premultiplied) alpha. All
//! blending is integer arithmetic so a frame re-rendered for export matches
//! the preview bit for bit.

use std::sync::Arc;

use crate::color::Color;
use crate::error::{ClipforgeError, Result};
use crate::geometry::{Rect, Vec2};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A video frame in CPU memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Fully transparent frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Frame filled with a solid color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut frame = Self::new(width, height);
        frame.fill(color);
        frame
    }

    /// Wrap existing RGBA8 bytes. Fails if the length does not match.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ClipforgeError::InvalidParameter(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Total memory usage of this frame in bytes.
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Memory usage in megabytes, used for cache accounting.
    #[inline]
    pub fn size_mb(&self) -> f64 {
        self.data.len() as f64 / (1024.0 * 1024.0)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some(Color::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&color.to_array());
    }

    /// Source-over a single color onto `(x, y)` at the given opacity.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color, opacity: f64) {
        if x >= self.width || y >= self.height {
            return;
        }
        let coverage = coverage(opacity);
        let i = self.offset(x, y);
        blend_over(&mut self.data[i..i + 4], color.to_array(), coverage);
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.to_array();
        for chunk in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Draw `src` over the whole frame at `opacity`, nearest-neighbour scaled
    /// when the sizes differ.
    pub fn draw(&mut self, src: &FrameBuffer, opacity: f64) {
        let full = Rect::new(0.0, 0.0, self.width as f32, self.height as f32);
        self.draw_clipped(src, opacity, full);
    }

    /// Like [`draw`](Self::draw), restricted to pixels whose centers fall
    /// inside `clip`.
    pub fn draw_clipped(&mut self, src: &FrameBuffer, opacity: f64, clip: Rect) {
        let coverage = coverage(opacity);
        if coverage == 0 || src.width == 0 || src.height == 0 {
            return;
        }
        let Some(region) = clip.intersection(Rect::new(
            0.0,
            0.0,
            self.width as f32,
            self.height as f32,
        )) else {
            return;
        };

        let x0 = region.x.floor().max(0.0) as u32;
        let y0 = region.y.floor().max(0.0) as u32;
        let x1 = (region.x + region.width).ceil().min(self.width as f32) as u32;
        let y1 = (region.y + region.height).ceil().min(self.height as f32) as u32;

        for y in y0..y1 {
            let sy = (y as u64 * src.height as u64 / self.height as u64) as u32;
            for x in x0..x1 {
                if !clip.contains(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    continue;
                }
                let sx = (x as u64 * src.width as u64 / self.width as u64) as u32;
                let si = src.offset(sx, sy);
                let px = [
                    src.data[si],
                    src.data[si + 1],
                    src.data[si + 2],
                    src.data[si + 3],
                ];
                let di = self.offset(x, y);
                blend_over(&mut self.data[di..di + 4], px, coverage);
            }
        }
    }

    /// Nearest-neighbour resample to `width x height`.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let mut out = Self::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                let si = self.offset(sx, sy);
                let di = out.offset(x, y);
                out.data[di..di + 4].copy_from_slice(&self.data[si..si + 4]);
            }
        }
        out
    }

    /// Create a test pattern frame (color bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        const BARS: [Color; 8] = [
            Color::rgb(255, 255, 255),
            Color::rgb(255, 255, 0),
            Color::rgb(0, 255, 255),
            Color::rgb(0, 255, 0),
            Color::rgb(255, 0, 255),
            Color::rgb(255, 0, 0),
            Color::rgb(0, 0, 255),
            Color::rgb(0, 0, 0),
        ];
        let mut frame = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let bar = (x as u64 * 8 / width as u64) as usize;
                frame.set_pixel(x, y, BARS[bar.min(7)]);
            }
        }
        frame
    }
}

/// Arc-wrapped frame buffer for shared ownership between cache and callers.
pub type SharedFrameBuffer = Arc<FrameBuffer>;

/// Opacity in `[0, 1]` to an integer coverage in `0..=255`.
#[inline]
pub fn coverage(opacity: f64) -> u32 {
    if opacity.is_nan() {
        return 0;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// Straight-alpha source-over of `src` onto `dst`, with `src` alpha scaled by
/// `coverage / 255`.
#[inline]
fn blend_over(dst: &mut [u8], src: [u8; 4], coverage: u32) {
    let sa = (src[3] as u32 * coverage + 127) / 255;
    if sa == 0 {
        return;
    }
    let da = dst[3] as u32;
    let inv = 255 - sa;
    let out_a = sa + (da * inv + 127) / 255;
    let denom = out_a * 255;
    for c in 0..3 {
        let num = src[c] as u32 * sa * 255 + dst[c] as u32 * da * inv;
        dst[c] = ((num + denom / 2) / denom).min(255) as u8;
    }
    dst[3] = out_a.min(255) as u8;
}
