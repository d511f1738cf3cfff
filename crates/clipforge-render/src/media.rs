//! Boundaries to media decoding and overlay rasterisation.
//!
//! The compositor never decodes media or rasterises text itself; it asks a
//! [`MediaSource`] for clip samples and an [`OverlayRenderer`] for one
//! drawable per overlay object.

use clipforge_core::{Color, FrameBuffer, ObjectTransform, Property, PropertyMap, SharedFrameBuffer, Vec2};
use clipforge_timeline::{AnimatableObject, MediaRef, OverlayKind, Shape};

/// Supplies decoded samples for clip sources.
pub trait MediaSource: Send + Sync {
    /// Sample of `source` at clip-local time `local_time`, or `None` if not
    /// ready. Repeated calls with the same arguments return the same sample.
    fn sample(&self, source: &MediaRef, local_time: f64) -> Option<SharedFrameBuffer>;
}

/// Turns overlay objects into drawables.
pub trait OverlayRenderer: Send + Sync {
    /// Create the drawable for `object`. Must succeed for every object.
    fn materialize(&self, object: &AnimatableObject) -> Box<dyn OverlayDrawable>;
}

/// A materialised overlay object.
pub trait OverlayDrawable: Send + Sync {
    /// Draw with the resolved property state onto `target`.
    fn draw(&self, properties: &PropertyMap, target: &mut FrameBuffer);
}

// ── Built-in box rasteriser ─────────────────────────────────────

/// Minimal rasteriser: shapes are filled, text and images are drawn as
/// translucent bounding boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxOverlayRenderer;

impl OverlayRenderer for BoxOverlayRenderer {
    fn materialize(&self, object: &AnimatableObject) -> Box<dyn OverlayDrawable> {
        let (width, height) = object.kind.size();
        let (outline, alpha) = match &object.kind {
            OverlayKind::Shape {
                shape: Shape::Circle { .. },
            } => (Outline::Ellipse, 1.0),
            OverlayKind::Shape { .. } => (Outline::Rect, 1.0),
            OverlayKind::Text { .. } | OverlayKind::Image { .. } => (Outline::Rect, PLACEHOLDER_ALPHA),
        };
        Box::new(BoxDrawable {
            width: width as f32,
            height: height as f32,
            outline,
            alpha,
        })
    }
}

const PLACEHOLDER_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outline {
    Rect,
    Ellipse,
}

#[derive(Debug, Clone, Copy)]
struct BoxDrawable {
    width: f32,
    height: f32,
    outline: Outline,
    alpha: f64,
}

impl BoxDrawable {
    fn covers(&self, local: Vec2) -> bool {
        match self.outline {
            Outline::Rect => {
                local.x >= 0.0 && local.x < self.width && local.y >= 0.0 && local.y < self.height
            }
            Outline::Ellipse => {
                let (rx, ry) = (self.width / 2.0, self.height / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (local.x - rx) / rx;
                let dy = (local.y - ry) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

impl OverlayDrawable for BoxDrawable {
    fn draw(&self, properties: &PropertyMap, target: &mut FrameBuffer) {
        let num = |key: Property, fallback: f64| properties.number(key).unwrap_or(fallback) as f32;
        let opacity = properties.number(Property::Opacity).unwrap_or(1.0) * self.alpha;
        if opacity <= 0.0 {
            return;
        }
        let fill = properties
            .get(Property::Fill)
            .and_then(|v| v.as_str())
            .and_then(|hex| Color::from_hex(hex).ok())
            .unwrap_or(Color::WHITE);

        let transform = ObjectTransform::new(
            num(Property::X, 0.0),
            num(Property::Y, 0.0),
            num(Property::ScaleX, 1.0),
            num(Property::ScaleY, 1.0),
            num(Property::Rotation, 0.0),
        );
        let canvas = clipforge_core::Rect::new(0.0, 0.0, target.width as f32, target.height as f32);
        let Some(region) = transform.bounds(self.width, self.height).intersection(canvas) else {
            return;
        };

        let x0 = region.x.floor() as u32;
        let y0 = region.y.floor() as u32;
        let x1 = (region.x + region.width).ceil().min(target.width as f32) as u32;
        let y1 = (region.y + region.height).ceil().min(target.height as f32) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(local) = transform.to_local(center) else {
                    return;
                };
                if self.covers(local) {
                    target.blend_pixel(x, y, fill, opacity);
                }
            }
        }
    }
}
