//! Geometric primitives for compositing and overlay placement.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2 as GlamVec2};
use serde::{Deserialize, Serialize};

/// 2D vector.
pub type Vec2 = GlamVec2;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of a set of points. Empty input gives a zero rect.
    pub fn bounding(points: &[Vec2]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn area(self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if a point is inside the rectangle (right/bottom edges exclusive).
    #[inline]
    pub fn contains(self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn intersection(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x1 < x2 && y1 < y2 {
            Some(Self::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }
}

/// Placement of an overlay object on the canvas.
///
/// Mirrors canvas-style objects: `(x, y)` is the object's top-left corner,
/// rotation (degrees, clockwise in screen space) pivots around that corner,
/// and scale applies in object-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    inner: Affine2,
}

impl ObjectTransform {
    pub fn new(x: f32, y: f32, scale_x: f32, scale_y: f32, rotation_deg: f32) -> Self {
        Self {
            inner: Affine2::from_scale_angle_translation(
                Vec2::new(scale_x, scale_y),
                rotation_deg.to_radians(),
                Vec2::new(x, y),
            ),
        }
    }

    /// Object-local point to canvas space.
    #[inline]
    pub fn to_canvas(&self, local: Vec2) -> Vec2 {
        self.inner.transform_point2(local)
    }

    /// Canvas point to object-local space. `None` for a degenerate (zero-scale) transform.
    #[inline]
    pub fn to_local(&self, canvas: Vec2) -> Option<Vec2> {
        if self.inner.matrix2.determinant().abs() < f32::EPSILON {
            return None;
        }
        Some(self.inner.inverse().transform_point2(canvas))
    }

    /// Canvas-space bounding box of a `width x height` object.
    pub fn bounds(&self, width: f32, height: f32) -> Rect {
        Rect::bounding(&[
            self.to_canvas(Vec2::ZERO),
            self.to_canvas(Vec2::new(width, 0.0)),
            self.to_canvas(Vec2::new(0.0, height)),
            self.to_canvas(Vec2::new(width, height)),
        ])
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            inner: Affine2::IDENTITY,
        }
    }
}
