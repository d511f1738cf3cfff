use clipforge_core::FrameBuffer;
use clipforge_timeline::Transition;

use super::fade::crossfade;
use crate::transition::TransitionEffect;

/// Preview dissolve. Blends like [`Fade`](super::Fade); the export backend
/// renders it as a pixelize crossfade.
pub struct Dissolve;

impl TransitionEffect for Dissolve {
    fn name(&self) -> &str {
        "Dissolve"
    }

    fn composite(
        &self,
        from: &FrameBuffer,
        to: &FrameBuffer,
        _transition: &Transition,
        progress: f64,
        target: &mut FrameBuffer,
    ) {
        crossfade(from, to, progress, target);
    }
}
