//! Time helpers for the timeline.
//!
//! Timeline positions are plain `f64` seconds. Frame identity for caching
//! goes through [`quantize`], which buckets a timestamp to a fixed number of
//! decimal places.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::defaults::CACHE_KEY_PRECISION;

/// Round `seconds` to [`CACHE_KEY_PRECISION`] decimals and return the bucket
/// as an integer (milliseconds at the default precision).
///
/// Two timestamps are the same frame iff they map to the same bucket.
#[inline]
pub fn quantize(seconds: f64) -> i64 {
    let scale = 10f64.powi(CACHE_KEY_PRECISION as i32);
    (seconds * scale).round() as i64
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Whole frames per second.
    #[inline]
    pub const fn fps(fps: u32) -> Self {
        Self::new(fps, 1)
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration(self) -> f64 {
        if self.numerator == 0 {
            return 0.0;
        }
        self.denominator as f64 / self.numerator as f64
    }

    /// Number of frames needed to cover `seconds`, rounded up.
    pub fn frames_in(self, seconds: f64) -> usize {
        if seconds <= 0.0 {
            return 0;
        }
        (seconds * self.to_fps_f64()).ceil() as usize
    }

    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A time range with inclusive start and exclusive end, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    #[inline]
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    /// `start <= t < end`
    #[inline]
    pub fn contains(self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Half-open ranges that merely touch do not overlap.
    #[inline]
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}
