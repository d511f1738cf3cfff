//! Transition resolver: progress, export descriptors and preview blending.

use clipforge_core::FrameBuffer;
use clipforge_timeline::{Transition, TransitionKind};
use std::collections::HashMap;

use crate::transitions::{Dissolve, Fade, Wipe};

/// A blend between an outgoing and an incoming frame.
pub trait TransitionEffect: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Composite `from` and `to` into `target` at `progress` in `[0, 1]`.
    ///
    /// Must be deterministic: the same inputs produce the same bytes.
    fn composite(
        &self,
        from: &FrameBuffer,
        to: &FrameBuffer,
        transition: &Transition,
        progress: f64,
        target: &mut FrameBuffer,
    );
}

/// Linear progress through a transition window, clamped to `[0, 1]`.
pub fn preview_progress(current: f64, start: f64, duration: f64) -> f64 {
    if current < start {
        return 0.0;
    }
    if current > start + duration || duration <= 0.0 {
        return 1.0;
    }
    ((current - start) / duration).clamp(0.0, 1.0)
}

/// Progress shaped by the transition's easing.
pub fn eased_progress(transition: &Transition, current: f64, start: f64) -> f64 {
    let linear = preview_progress(current, start, transition.duration);
    transition.easing.apply(linear)
}

/// Blend descriptor handed to the export backend (ffmpeg filter syntax).
pub fn filter_descriptor(transition: &Transition) -> String {
    let d = transition.duration;
    match transition.kind {
        TransitionKind::Fade => format!("fade=t=in:st=0:d={d}:alpha=1"),
        TransitionKind::Wipe => format!(
            "xfade=transition=wipe{}:duration={d}:offset=0",
            transition.wipe_direction().as_str()
        ),
        TransitionKind::Dissolve => format!("xfade=transition=pixelize:duration={d}:offset=0"),
    }
}

/// Effects keyed by transition kind.
pub struct TransitionRegistry {
    effects: HashMap<TransitionKind, Box<dyn TransitionEffect>>,
}

impl TransitionRegistry {
    /// Create a new registry with all built-in transitions.
    pub fn new() -> Self {
        let mut reg = Self {
            effects: HashMap::new(),
        };
        reg.register(TransitionKind::Fade, Box::new(Fade));
        reg.register(TransitionKind::Wipe, Box::new(Wipe));
        reg.register(TransitionKind::Dissolve, Box::new(Dissolve));
        reg
    }

    /// Replace the effect used for `kind`.
    pub fn register(&mut self, kind: TransitionKind, effect: Box<dyn TransitionEffect>) {
        self.effects.insert(kind, effect);
    }

    pub fn get(&self, kind: TransitionKind) -> Option<&dyn TransitionEffect> {
        self.effects.get(&kind).map(|e| e.as_ref())
    }

    /// Get all registered effect names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.effects.values().map(|e| e.name()).collect();
        names.sort_unstable();
        names
    }

    /// Composite with the effect registered for the transition's kind.
    pub fn composite(
        &self,
        from: &FrameBuffer,
        to: &FrameBuffer,
        transition: &Transition,
        progress: f64,
        target: &mut FrameBuffer,
    ) {
        match self.get(transition.kind) {
            Some(effect) => effect.composite(from, to, transition, progress, target),
            None => composite(from, to, transition, progress, target),
        }
    }
}

impl Default for TransitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite with the built-in effect for the transition's kind.
pub fn composite(
    from: &FrameBuffer,
    to: &FrameBuffer,
    transition: &Transition,
    progress: f64,
    target: &mut FrameBuffer,
) {
    let effect: &dyn TransitionEffect = match transition.kind {
        TransitionKind::Fade => &Fade,
        TransitionKind::Wipe => &Wipe,
        TransitionKind::Dissolve => &Dissolve,
    };
    effect.composite(from, to, transition, progress, target);
}
