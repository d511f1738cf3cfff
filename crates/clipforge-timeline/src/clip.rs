//! Clip types for the timeline.

use clipforge_core::TimeRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::transition::Transition;

/// Opaque handle to a media source (URL, path, asset id).
///
/// The engine never interprets it; media providers resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A clip placed on a video or overlay track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: Uuid,
    /// Owning track. Kept in sync by the timeline.
    pub track_id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Timeline seconds, inclusive.
    pub start: f64,
    /// Timeline seconds, exclusive. Always `> start`.
    pub end: f64,
    pub source: MediaRef,
    /// Transition on the inbound edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Clip {
    /// New clip spanning `[start, end)`. The track id is assigned on insertion.
    pub fn new(source: MediaRef, start: f64, end: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_id: Uuid::nil(),
            name: String::new(),
            start,
            end,
            source,
            transition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// `start <= t < end`
    #[inline]
    pub fn is_active_at(&self, t: f64) -> bool {
        self.range().contains(t)
    }

    /// Clip-local time for timeline time `t`.
    #[inline]
    pub fn local_time(&self, t: f64) -> f64 {
        t - self.start
    }

    /// Whether `t` falls inside the inbound transition window.
    pub fn in_transition_at(&self, t: f64) -> bool {
        self.transition
            .as_ref()
            .is_some_and(|tr| tr.is_valid() && tr.window(self.start).contains(t))
    }
}
