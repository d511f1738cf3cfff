use clipforge_core::{FrameBuffer, Rect};
use clipforge_timeline::{Transition, WipeDirection};

use crate::transition::TransitionEffect;

/// Hard-edged wipe: `from` drawn fully, `to` revealed through a growing rectangle.
pub struct Wipe;

/// Region of a `width x height` frame showing the incoming clip at `progress`.
pub fn reveal_rect(direction: WipeDirection, width: u32, height: u32, progress: f64) -> Rect {
    let p = progress.clamp(0.0, 1.0) as f32;
    let (w, h) = (width as f32, height as f32);
    match direction {
        WipeDirection::Left => Rect::new(w * (1.0 - p), 0.0, w * p, h),
        WipeDirection::Right => Rect::new(0.0, 0.0, w * p, h),
        WipeDirection::Up => Rect::new(0.0, h * (1.0 - p), w, h * p),
        WipeDirection::Down => Rect::new(0.0, 0.0, w, h * p),
    }
}

impl TransitionEffect for Wipe {
    fn name(&self) -> &str {
        "Wipe"
    }

    fn composite(
        &self,
        from: &FrameBuffer,
        to: &FrameBuffer,
        transition: &Transition,
        progress: f64,
        target: &mut FrameBuffer,
    ) {
        target.draw(from, 1.0);
        let clip = reveal_rect(
            transition.wipe_direction(),
            target.width,
            target.height,
            progress,
        );
        target.draw_clipped(to, 1.0, clip);
    }
}
