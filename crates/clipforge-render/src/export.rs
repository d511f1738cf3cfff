//! Export driver: renders a time range through the compositor and hands
//! each frame to a sink.

use clipforge_core::{FrameBuffer, FrameRate};
use clipforge_timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::compositor::FrameCompositor;
use crate::transition::filter_descriptor;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export range: {start}..{end}")]
    InvalidRange { start: f64, end: f64 },

    #[error("Export cancelled after {frames} frames")]
    Cancelled { frames: usize },

    #[error("Frame sink error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Time range and frame rate to export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub start: f64,
    pub end: f64,
    pub frame_rate: FrameRate,
}

impl ExportRequest {
    pub fn new(start: f64, end: f64, frame_rate: FrameRate) -> Self {
        Self {
            start,
            end,
            frame_rate,
        }
    }

    /// Whole timeline at `frame_rate`.
    pub fn whole(timeline: &Timeline, frame_rate: FrameRate) -> Self {
        Self::new(0.0, timeline.duration(), frame_rate)
    }

    pub fn total_frames(&self) -> usize {
        self.frame_rate.frames_in(self.end - self.start)
    }

    /// `start + i / fps` for every frame in the range.
    pub fn frame_times(&self) -> Vec<f64> {
        let fps = self.frame_rate.to_fps_f64();
        (0..self.total_frames())
            .map(|i| self.start + i as f64 / fps)
            .collect()
    }

    fn validate(&self) -> Result<(), ExportError> {
        let ok = self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end >= self.start;
        if ok {
            Ok(())
        } else {
            Err(ExportError::InvalidRange {
                start: self.start,
                end: self.end,
            })
        }
    }

    /// FFmpeg arguments for encoding the raw RGBA stream this driver produces.
    pub fn ffmpeg_input_args(&self, width: u32, height: u32) -> Vec<String> {
        vec![
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            "rgba".into(),
            "-video_size".into(),
            format!("{width}x{height}"),
            "-framerate".into(),
            format!(
                "{}/{}",
                self.frame_rate.numerator, self.frame_rate.denominator
            ),
            "-i".into(),
            "pipe:0".into(),
        ]
    }
}

/// Blend descriptors for every clip with an inbound transition, in track order.
pub fn transition_filters(timeline: &Timeline) -> Vec<(Uuid, String)> {
    timeline
        .tracks()
        .iter()
        .flat_map(|track| track.clips.iter())
        .filter_map(|clip| {
            clip.transition
                .filter(|t| t.is_valid())
                .map(|t| (clip.id, filter_descriptor(&t)))
        })
        .collect()
}

/// Receives composited frames in order.
pub trait FrameSink {
    fn write_frame(&mut self, index: usize, time: f64, frame: &FrameBuffer) -> std::io::Result<()>;

    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl FrameSink for Vec<FrameBuffer> {
    fn write_frame(&mut self, _index: usize, _time: f64, frame: &FrameBuffer) -> std::io::Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Export progress information.
#[derive(Debug, Clone, Copy)]
pub struct ExportProgress {
    /// Frames written so far.
    pub frames_done: usize,
    pub total_frames: usize,
    /// Render speed in frames per second.
    pub fps: f64,
}

impl ExportProgress {
    /// Completion fraction, `(i + 1) / total` after frame `i`.
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 1.0;
        }
        self.frames_done as f64 / self.total_frames as f64
    }
}

/// Handle for cancelling an in-progress export.
#[derive(Debug, Clone, Default)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub elapsed_secs: f64,
}

/// Render every frame of `request` and write it to `sink`.
pub fn export_frames(
    compositor: &mut FrameCompositor,
    timeline: &Timeline,
    request: &ExportRequest,
    sink: &mut dyn FrameSink,
    on_progress: impl Fn(ExportProgress),
    cancel: &ExportCancel,
) -> Result<ExportSummary, ExportError> {
    request.validate()?;
    let times = request.frame_times();
    let total_frames = times.len();
    let started = Instant::now();
    info!(
        start = request.start,
        end = request.end,
        fps = request.frame_rate.to_fps_f64(),
        total_frames,
        "export started"
    );

    for (i, &t) in times.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled { frames: i });
        }
        let frame = compositor.render_at(timeline, t);
        sink.write_frame(i, t, &frame)?;

        let elapsed = started.elapsed().as_secs_f64();
        on_progress(ExportProgress {
            frames_done: i + 1,
            total_frames,
            fps: if elapsed > 0.0 {
                (i + 1) as f64 / elapsed
            } else {
                0.0
            },
        });
    }
    sink.finish()?;

    let config = compositor.config();
    let summary = ExportSummary {
        frames: total_frames,
        width: config.width,
        height: config.height,
        elapsed_secs: started.elapsed().as_secs_f64(),
    };
    info!(frames = summary.frames, elapsed = summary.elapsed_secs, "export finished");
    Ok(summary)
}
