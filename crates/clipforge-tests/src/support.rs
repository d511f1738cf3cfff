//! Shared fixtures: solid-color media and a recording overlay renderer.

use clipforge_core::{Color, FrameBuffer, Property, PropertyMap, SharedFrameBuffer};
use clipforge_render::{MediaSource, OverlayDrawable, OverlayRenderer};
use clipforge_timeline::{AnimatableObject, MediaRef};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Sources named `#rrggbb` decode to solid frames; sources listed as
/// missing never decode.
#[derive(Default)]
pub struct SolidMedia {
    pub missing: HashSet<String>,
}

impl MediaSource for SolidMedia {
    fn sample(&self, source: &MediaRef, _local_time: f64) -> Option<SharedFrameBuffer> {
        if self.missing.contains(source.as_str()) {
            return None;
        }
        let color = Color::from_hex(source.as_str()).ok()?;
        Some(Arc::new(FrameBuffer::filled(4, 4, color)))
    }
}

/// Opacity each object was drawn with, in draw order.
pub type DrawLog = Arc<Mutex<Vec<(Uuid, f64)>>>;

/// Records resolved properties and fills the whole canvas in white at the
/// resolved opacity.
pub struct RecordingRenderer {
    pub log: DrawLog,
}

struct RecordingDrawable {
    id: Uuid,
    log: DrawLog,
}

impl OverlayRenderer for RecordingRenderer {
    fn materialize(&self, object: &AnimatableObject) -> Box<dyn OverlayDrawable> {
        Box::new(RecordingDrawable {
            id: object.id,
            log: self.log.clone(),
        })
    }
}

impl OverlayDrawable for RecordingDrawable {
    fn draw(&self, properties: &PropertyMap, target: &mut FrameBuffer) {
        let opacity = properties.number(Property::Opacity).unwrap_or(1.0);
        if let Ok(mut log) = self.log.lock() {
            log.push((self.id, opacity));
        }
        target.draw(&FrameBuffer::filled(1, 1, Color::WHITE), opacity);
    }
}

pub fn new_log() -> DrawLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn logged(log: &DrawLog) -> Vec<(Uuid, f64)> {
    log.lock().map(|l| l.clone()).unwrap_or_default()
}
