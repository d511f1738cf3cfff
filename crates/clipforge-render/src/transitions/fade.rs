use clipforge_core::FrameBuffer;
use clipforge_timeline::Transition;

use crate::transition::TransitionEffect;

/// Opacity crossfade: `from` at `1 - p`, then `to` at `p`.
pub struct Fade;

pub(crate) fn crossfade(from: &FrameBuffer, to: &FrameBuffer, progress: f64, target: &mut FrameBuffer) {
    let p = progress.clamp(0.0, 1.0);
    target.draw(from, 1.0 - p);
    target.draw(to, p);
}

impl TransitionEffect for Fade {
    fn name(&self) -> &str {
        "Fade"
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
