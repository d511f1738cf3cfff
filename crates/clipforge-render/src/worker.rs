//! Background jobs for CPU-heavy pixel work.
//!
//! Jobs run on tokio's blocking pool and are strictly request/response: the
//! caller awaits one result or a timeout. They never touch timeline or clock
//! state.

use clipforge_core::{defaults, FrameBuffer, SharedFrameBuffer};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by background jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job {job} timed out after {after:?}")]
    Timeout { job: &'static str, after: Duration },

    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job was cancelled")]
    Cancelled,
}

impl JobError {
    /// Whether retrying the same job may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}

pub type JobResult<T> = std::result::Result<T, JobError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub timeout_ms: u64,
}

impl WorkerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::WORKER_TIMEOUT_SECS * 1000,
        }
    }
}

/// Per-pixel filter applied by [`BackgroundWorker::process_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PixelFilter {
    /// Add to each color channel.
    Brightness(f32),
    /// Contrast in `[-255, 255]`.
    Contrast(f32),
    /// Luma (BT.601 weights).
    Grayscale,
}

impl PixelFilter {
    pub fn apply(self, frame: &mut FrameBuffer) {
        let data = frame.data_mut();
        match self {
            Self::Brightness(v) => map_channels(data, |c| c + v),
            Self::Contrast(v) => {
                let v = v.clamp(-255.0, 255.0);
                let factor = (259.0 * (v + 255.0)) / (255.0 * (259.0 - v));
                map_channels(data, |c| factor * (c - 128.0) + 128.0);
            }
            Self::Grayscale => {
                for px in data.chunks_exact_mut(4) {
                    let gray = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                    let g = to_channel(gray);
                    px[..3].fill(g);
                }
            }
        }
    }
}

fn map_channels(data: &mut [u8], f: impl Fn(f32) -> f32) {
    for px in data.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = to_channel(f(*c as f32));
        }
    }
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Runs jobs on the blocking pool with a bounded wait.
pub struct BackgroundWorker {
    config: WorkerConfig,
    next_id: AtomicU64,
}

impl BackgroundWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Copy `frame` and apply `filters` in order.
    pub async fn process_frame(
        &self,
        frame: SharedFrameBuffer,
        filters: Vec<PixelFilter>,
    ) -> JobResult<FrameBuffer> {
        self.run("process-frame", move || {
            let mut out = FrameBuffer::clone(&frame);
            for filter in filters {
                filter.apply(&mut out);
            }
            Ok(out)
        })
        .await
    }

    /// Nearest-neighbour downscale to `width x height`.
    pub async fn thumbnail(
        &self,
        frame: SharedFrameBuffer,
        width: u32,
        height: u32,
    ) -> JobResult<FrameBuffer> {
        self.run("generate-thumbnail", move || {
            if width == 0 || height == 0 {
                return Err(JobError::Failed(format!(
                    "thumbnail size must be non-zero, got {width}x{height}"
                )));
            }
            Ok(frame.resized(width, height))
        })
        .await
    }

    /// Run `work` on the blocking pool, giving up after the configured timeout.
    ///
    /// A timed-out job keeps running to completion; its result is discarded.
    pub async fn run<T, F>(&self, job: &'static str, work: F) -> JobResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> JobResult<T> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let after = self.config.timeout();
        debug!(id, job, "job started");

        let handle = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(after, handle).await {
            Ok(Ok(result)) => {
                if let Err(e) = &result {
                    warn!(id, job, error = %e, "job failed");
                }
                result
            }
            Ok(Err(join)) if join.is_cancelled() => Err(JobError::Cancelled),
            Ok(Err(join)) => Err(JobError::Failed(format!("{job} panicked: {join}"))),
            Err(_) => {
                warn!(id, job, ?after, "job timed out");
                Err(JobError::Timeout { job, after })
            }
        }
    }
}

impl Default for BackgroundWorker {
    fn default() -> Self {
        Self::new(WorkerConfig::default())
    }
}
