//! Clipforge Core - Foundation types for the timeline engine
//!
//! This crate provides the leaf types used throughout clipforge:
//! - Easing curves and keyframe tracks
//! - Time helpers (quantization, frame rates, ranges)
//! - Colors, RGBA frame buffers and compositing primitives
//! - Geometric primitives

pub mod color;
pub mod easing;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod keyframe;
pub mod time;

pub use color::Color;
pub use easing::{ease, Easing};
pub use error::{ClipforgeError, Result};
pub use frame::{FrameBuffer, SharedFrameBuffer};
pub use geometry::{ObjectTransform, Rect, Vec2};
pub use keyframe::{Keyframe, KeyframeTrack, Property, PropertyMap, PropertyValue};
pub use time::{quantize, FrameRate, TimeRange};

/// Engine-wide constants.
pub mod defaults {
    /// Frame cache entry limit.
    pub const MAX_CACHED_FRAMES: usize = 50;

    /// Frame cache memory budget in megabytes.
    pub const MAX_CACHE_MEMORY_MB: f64 = 100.0;

    /// Decimal places kept when quantizing a timestamp into a cache key.
    pub const CACHE_KEY_PRECISION: u32 = 3;

    /// Shortest clip a resize may produce, in seconds.
    pub const MIN_CLIP_DURATION: f64 = 0.1;

    /// Upper bound on a single background job.
    pub const WORKER_TIMEOUT_SECS: u64 = 30;

    /// Default project frame rate.
    pub const FPS: u32 = 30;

    /// Default canvas size.
    pub const CANVAS_WIDTH: u32 = 1920;
    pub const CANVAS_HEIGHT: u32 = 1080;
}
