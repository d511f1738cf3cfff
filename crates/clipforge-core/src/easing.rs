//! Easing curves for keyframe interpolation and transition blending.
//!
//! Every curve maps normalized progress in `[0, 1]` onto eased progress in
//! `[0, 1]`, is monotonic, and satisfies `f(0) = 0`, `f(1) = 1`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How progress is shaped between two keyframes (or across a transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// `t`
    #[default]
    Linear,
    /// `t²`
    EaseIn,
    /// `t·(2−t)`
    EaseOut,
    /// Quadratic in, quadratic out.
    EaseInOut,
}

impl Easing {
    /// All easing kinds in display order.
    pub const ALL: [Easing; 4] = [
        Self::Linear,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
    ];

    /// Apply the curve to `t`. Input outside `[0, 1]` is clamped first.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }

    /// Stable identifier used in persisted projects and UIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "easeIn",
            Self::EaseOut => "easeOut",
            Self::EaseInOut => "easeInOut",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-function form of [`Easing::apply`].
#[inline]
pub fn ease(kind: Easing, t: f64) -> f64 {
    kind.apply(t)
}
