//! Overlay objects and the side-table that owns them.
//!
//! Objects are stored in an arena ([`OverlayStore`]) indexed by id, so the
//! model never depends on how a renderer represents its drawables.

use clipforge_core::{Easing, KeyframeTrack, Property, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::clip::MediaRef;

/// Primitive shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
}

/// What an overlay object is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    Text { content: String, font_size: f64 },
    Shape { shape: Shape },
    Image { source: MediaRef, width: f64, height: f64 },
}

impl OverlayKind {
    /// Unscaled object-local size `(width, height)`.
    ///
    /// Text is estimated from glyph count; renderers that lay out real text
    /// should measure instead.
    pub fn size(&self) -> (f64, f64) {
        match self {
            Self::Text { content, font_size } => {
                let chars = content.chars().count().max(1) as f64;
                (chars * font_size * 0.6, font_size * 1.2)
            }
            Self::Shape {
                shape: Shape::Rect { width, height },
            } => (*width, *height),
            Self::Shape {
                shape: Shape::Circle { radius },
            } => (radius * 2.0, radius * 2.0),
            Self::Image { width, height, .. } => (*width, *height),
        }
    }
}

/// Base values every object starts with.
pub fn default_properties() -> PropertyMap {
    PropertyMap::new()
        .with(Property::X, 0.0)
        .with(Property::Y, 0.0)
        .with(Property::ScaleX, 1.0)
        .with(Property::ScaleY, 1.0)
        .with(Property::Rotation, 0.0)
        .with(Property::Opacity, 1.0)
        .with(Property::Fill, "#ffffff")
}

/// An overlay entity with static base properties and a keyframe track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatableObject {
    pub id: Uuid,
    /// Overlay track that owns the object.
    pub track_id: Uuid,
    #[serde(default)]
    pub name: String,
    pub kind: OverlayKind,
    #[serde(default = "default_properties")]
    pub base: PropertyMap,
    #[serde(default)]
    pub keyframes: KeyframeTrack,
}

impl AnimatableObject {
    pub fn new(kind: OverlayKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_id: Uuid::nil(),
            name: String::new(),
            kind,
            base: default_properties(),
            keyframes: KeyframeTrack::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: override base properties.
    pub fn with_base(mut self, overrides: &PropertyMap) -> Self {
        self.base.merge(overrides);
        self
    }

    /// Property state at timeline time `t`.
    pub fn resolve(&self, t: f64) -> PropertyMap {
        self.keyframes.resolve(&self.base, t)
    }

    /// Insert or replace a keyframe.
    pub fn set_keyframe(
        &mut self,
        time: f64,
        properties: PropertyMap,
        easing: Easing,
    ) -> clipforge_core::Result<()> {
        self.keyframes.set(time, properties, easing)
    }
}

// ── Object arena ────────────────────────────────────────────────

/// Insertion-ordered arena of overlay objects with an id index.
///
/// Insertion order is stacking order (later objects draw on top).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<AnimatableObject>", into = "Vec<AnimatableObject>")]
pub struct OverlayStore {
    objects: Vec<AnimatableObject>,
    index: HashMap<Uuid, usize>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object on top of the stack. An object with the same id is replaced in place.
    pub fn insert(&mut self, object: AnimatableObject) {
        if let Some(&i) = self.index.get(&object.id) {
            self.objects[i] = object;
            return;
        }
        self.index.insert(object.id, self.objects.len());
        self.objects.push(object);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<AnimatableObject> {
        let i = self.index.remove(&id)?;
        let removed = self.objects.remove(i);
        self.reindex_from(i);
        Some(removed)
    }

    /// Remove every object owned by `track_id`. Returns the removed ids.
    pub fn remove_track(&mut self, track_id: Uuid) -> Vec<Uuid> {
        let removed: Vec<Uuid> = self
            .objects
            .iter()
            .filter(|o| o.track_id == track_id)
            .map(|o| o.id)
            .collect();
        if !removed.is_empty() {
            self.objects.retain(|o| o.track_id != track_id);
            self.index.clear();
            self.reindex_from(0);
        }
        removed
    }

    pub fn get(&self, id: Uuid) -> Option<&AnimatableObject> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut AnimatableObject> {
        self.index.get(&id).map(|&i| &mut self.objects[i])
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Objects in stacking order.
    pub fn iter(&self) -> impl Iterator<Item = &AnimatableObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnimatableObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.index.clear();
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, obj) in self.objects.iter().enumerate().skip(start) {
            self.index.insert(obj.id, i);
        }
    }
}

impl PartialEq for OverlayStore {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects
    }
}

impl From<Vec<AnimatableObject>> for OverlayStore {
    fn from(objects: Vec<AnimatableObject>) -> Self {
        let mut store = Self::new();
        for obj in objects {
            store.insert(obj);
        }
        store
    }
}

impl From<OverlayStore> for Vec<AnimatableObject> {
    fn from(store: OverlayStore) -> Self {
        store.objects
    }
}
