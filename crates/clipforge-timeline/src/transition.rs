//! Transition descriptors attached to a clip's inbound boundary.

use clipforge_core::{Easing, TimeRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of blend between the outgoing and incoming clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Fade,
    Wipe,
    Dissolve,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fade => "fade",
            Self::Wipe => "wipe",
            Self::Dissolve => "dissolve",
        })
    }
}

/// Direction a wipe travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipeDirection {
    #[default]
    Left,
    Right,
    Up,
    Down,
}

impl WipeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Transition on a clip's inbound edge.
///
/// Its effect window is `[clip_start, clip_start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Seconds, > 0.
    pub duration: f64,
    /// Only meaningful for wipes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<WipeDirection>,
    #[serde(default)]
    pub easing: Easing,
}

impl Transition {
    pub fn fade(duration: f64) -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration,
            direction: None,
            easing: Easing::Linear,
        }
    }

    pub fn dissolve(duration: f64) -> Self {
        Self {
            kind: TransitionKind::Dissolve,
            ..Self::fade(duration)
        }
    }

    pub fn wipe(duration: f64, direction: WipeDirection) -> Self {
        Self {
            kind: TransitionKind::Wipe,
            direction: Some(direction),
            ..Self::fade(duration)
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Wipe direction, defaulting to left.
    pub fn wipe_direction(&self) -> WipeDirection {
        self.direction.unwrap_or_default()
    }

    /// Whether the duration is usable.
    pub fn is_valid(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Effect window on the timeline for a clip starting at `clip_start`.
    pub fn window(&self, clip_start: f64) -> TimeRange {
        TimeRange::new(clip_start, clip_start + self.duration)
    }
}

// ── Presets ─────────────────────────────────────────────────────

/// A named, ready-to-apply transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub transition: Transition,
}

const fn preset(
    id: &'static str,
    name: &'static str,
    kind: TransitionKind,
    duration: f64,
    direction: Option<WipeDirection>,
) -> TransitionPreset {
    TransitionPreset {
        id,
        name,
        transition: Transition {
            kind,
            duration,
            direction,
            easing: Easing::Linear,
        },
    }
}

/// Built-in transition catalogue.
pub const PRESETS: [TransitionPreset; 8] = [
    preset("fade-in", "Fade In", TransitionKind::Fade, 1.0, None),
    preset("fade-out", "Fade Out", TransitionKind::Fade, 1.0, None),
    preset("crossfade", "Crossfade", TransitionKind::Fade, 1.0, None),
    preset("wipe-left", "Wipe Left", TransitionKind::Wipe, 0.5, Some(WipeDirection::Left)),
    preset("wipe-right", "Wipe Right", TransitionKind::Wipe, 0.5, Some(WipeDirection::Right)),
    preset("wipe-up", "Wipe Up", TransitionKind::Wipe, 0.5, Some(WipeDirection::Up)),
    preset("wipe-down", "Wipe Down", TransitionKind::Wipe, 0.5, Some(WipeDirection::Down)),
    preset("dissolve", "Dissolve", TransitionKind::Dissolve, 0.8, None),
];

/// Look up a preset by id.
pub fn preset_by_id(id: &str) -> Option<&'static TransitionPreset> {
    PRESETS.iter().find(|p| p.id == id)
}
