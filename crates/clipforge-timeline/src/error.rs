//! Error types for timeline mutations.

use thiserror::Error;
use uuid::Uuid;

use crate::track::TrackKind;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("track not found: {0}")]
    TrackNotFound(Uuid),

    #[error("clip not found: {0}")]
    ClipNotFound(Uuid),

    #[error("audio event not found: {0}")]
    AudioEventNotFound(Uuid),

    #[error("overlay object not found: {0}")]
    ObjectNotFound(Uuid),

    /// Mutation attempted on a locked track.
    #[error("track {0} is locked")]
    TrackLocked(Uuid),

    /// Placement would overlap an existing clip on the same track.
    #[error("clip would overlap {existing} on track {track} ([{start:.3}s, {end:.3}s))")]
    Overlap {
        track: Uuid,
        existing: Uuid,
        start: f64,
        end: f64,
    },

    #[error("track {track} is {actual:?}, expected {expected:?}")]
    WrongTrackKind {
        track: Uuid,
        expected: TrackKind,
        actual: TrackKind,
    },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error(transparent)]
    Core(#[from] clipforge_core::ClipforgeError),
}

pub type Result<T> = std::result::Result<T, TimelineError>;
