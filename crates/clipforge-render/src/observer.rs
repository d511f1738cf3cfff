//! Non-fatal render gap reporting.

use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Something the compositor could not draw. The frame is still produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderGap {
    /// No sample was available for an active clip; the layer was left blank.
    MissingSample { track: Uuid, clip: Uuid, time: f64 },
    /// The outgoing side of a transition had no sample; blended from the background.
    MissingTransitionSource { track: Uuid, clip: Uuid, time: f64 },
}

impl fmt::Display for RenderGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSample { clip, time, .. } => {
                write!(f, "no sample for clip {clip} at {time:.3}s")
            }
            Self::MissingTransitionSource { clip, time, .. } => {
                write!(f, "no outgoing sample for transition into clip {clip} at {time:.3}s")
            }
        }
    }
}

/// Receives render gaps.
pub trait RenderObserver: Send + Sync {
    fn on_gap(&self, gap: &RenderGap);
}

/// Reports gaps as `warn!` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RenderObserver for TracingObserver {
    fn on_gap(&self, gap: &RenderGap) {
        match gap {
            RenderGap::MissingSample { track, clip, time }
            | RenderGap::MissingTransitionSource { track, clip, time } => {
                warn!(%track, %clip, time, "render gap: {}", gap);
            }
        }
    }
}
