//! Clipforge Render - frame production for preview and export
//!
//! - Bounded LRU frame cache with async preload
//! - Transition resolver (fade, wipe, dissolve) and export descriptors
//! - CPU frame compositor with overlay objects and render-gap reporting
//! - Background pixel jobs with timeouts
//! - Export driver

pub mod cache;
pub mod compositor;
pub mod export;
pub mod media;
pub mod observer;
pub mod transition;
pub mod transitions;
pub mod worker;

pub use cache::{CacheConfig, CacheStats, FrameCache, Quality};
pub use compositor::{CompositorConfig, FrameCompositor};
pub use export::{
    export_frames, transition_filters, ExportCancel, ExportError, ExportProgress, ExportRequest,
    ExportSummary, FrameSink,
};
pub use media::{BoxOverlayRenderer, MediaSource, OverlayDrawable, OverlayRenderer};
pub use observer::{RenderGap, RenderObserver, TracingObserver};
pub use transition::{
    composite, eased_progress, filter_descriptor, preview_progress, TransitionEffect,
    TransitionRegistry,
};
pub use worker::{BackgroundWorker, JobError, JobResult, PixelFilter, WorkerConfig};
