//! Audio events on audio tracks.
//!
//! Unlike clips, audio events on the same track may overlap; they are mixed.

use clipforge_core::TimeRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::MediaRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    #[serde(alias = "tts")]
    Speech,
    Music,
    #[serde(alias = "sound-effect")]
    Effect,
}

/// A sound placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioEvent {
    pub id: Uuid,
    pub kind: AudioKind,
    pub start: f64,
    pub duration: f64,
    pub source: MediaRef,
    /// Linear gain in `[0, 1]`.
    pub volume: f64,
    /// Seconds of linear fade from silence at the start.
    #[serde(default)]
    pub fade_in: f64,
    /// Seconds of linear fade to silence at the end.
    #[serde(default)]
    pub fade_out: f64,
}

impl AudioEvent {
    pub fn new(kind: AudioKind, source: MediaRef, start: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            start,
            duration,
            source,
            volume: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    /// Builder: volume is clamped to `[0, 1]`.
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = fade_in.max(0.0);
        self.fade_out = fade_out.max(0.0);
        self
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    #[inline]
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end())
    }

    /// Gain at timeline time `t`: `volume` shaped by the fade envelope, 0
    /// outside the event.
    pub fn gain_at(&self, t: f64) -> f64 {
        if !self.range().contains(t) {
            return 0.0;
        }
        let local = t - self.start;
        let remaining = self.end() - t;
        let mut envelope: f64 = 1.0;
        if self.fade_in > 0.0 && local < self.fade_in {
            envelope = envelope.min(local / self.fade_in);
        }
        if self.fade_out > 0.0 && remaining < self.fade_out {
            envelope = envelope.min(remaining / self.fade_out);
        }
        self.volume.clamp(0.0, 1.0) * envelope.clamp(0.0, 1.0)
    }
}
