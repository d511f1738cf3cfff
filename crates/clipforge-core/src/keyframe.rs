//! Keyframe animation for overlay objects.
//!
//! A [`KeyframeTrack`] holds time-sorted, time-unique keyframes, each a
//! partial map of property targets. [`KeyframeTrack::resolve`] folds the
//! track over an object's base properties to produce the state at a time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::easing::Easing;
use crate::error::{ClipforgeError, Result};
use crate::time::TimeRange;

// ── Properties ──────────────────────────────────────────────────

/// An animatable overlay property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    X,
    Y,
    ScaleX,
    ScaleY,
    /// Degrees.
    Rotation,
    Opacity,
    /// Hex color string; steps instead of interpolating.
    Fill,
}

impl Property {
    /// Properties that interpolate numerically.
    pub const NUMERIC: [Property; 6] = [
        Self::X,
        Self::Y,
        Self::ScaleX,
        Self::ScaleY,
        Self::Rotation,
        Self::Opacity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Discrete(String),
}

impl PropertyValue {
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Discrete(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Discrete(s) => Some(s),
        }
    }

    /// Numbers lerp; anything else steps at the midpoint of linear progress.
    fn interpolate(start: &Self, end: &Self, progress: f64, eased: f64) -> Self {
        match (start, end) {
            (Self::Number(a), Self::Number(b)) => Self::Number(a + (b - a) * eased),
            _ if progress < 0.5 => start.clone(),
            _ => end.clone(),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Discrete(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Discrete(v)
    }
}

/// Small ordered map of property values, kept sorted by [`Property`].
///
/// Serialized as a JSON object (`{"x": 10, "opacity": 0.5}`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: SmallVec<[(Property, PropertyValue); 8]>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: Property) -> Option<&PropertyValue> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(&key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Numeric value of `key`, if present and numeric.
    pub fn number(&self, key: Property) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_number)
    }

    pub fn contains(&self, key: Property) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: Property, value: impl Into<PropertyValue>) {
        let value = value.into();
        match self.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (key, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: Property, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: Property) -> Option<PropertyValue> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(&key))
            .ok()
            .map(|i| self.entries.remove(i).1)
    }

    /// Overwrite entries with every entry of `other`.
    pub fn merge(&mut self, other: &PropertyMap) {
        for (k, v) in other.iter() {
            self.set(k, v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Property, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (Property, PropertyValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = BTreeMap::<Property, PropertyValue>::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}

// ── Keyframe ────────────────────────────────────────────────────

/// Target property values at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds, relative to the object's track.
    pub time: f64,
    pub properties: PropertyMap,
    /// Shapes interpolation INTO this keyframe from the previous one.
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f64, properties: PropertyMap, easing: Easing) -> Self {
        Self {
            time,
            properties,
            easing,
        }
    }
}

fn check_time(time: f64) -> Result<()> {
    if !time.is_finite() || time < 0.0 {
        return Err(ClipforgeError::InvalidParameter(format!(
            "keyframe time must be a non-negative finite number, got {time}"
        )));
    }
    Ok(())
}

// ── Keyframe track ──────────────────────────────────────────────

/// Keyframes of one animatable object.
///
/// Always sorted ascending by time with at most one keyframe per time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from keyframes in any order. Later duplicates of a time
    /// replace earlier ones.
    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Result<Self> {
        let mut track = Self::new();
        for kf in keyframes {
            track.set(kf.time, kf.properties, kf.easing)?;
        }
        Ok(track)
    }

    /// Insert or replace the keyframe at `time`. Maintains sorted order.
    ///
    /// Negative or non-finite times are rejected and leave the track untouched.
    pub fn set(&mut self, time: f64, properties: PropertyMap, easing: Easing) -> Result<()> {
        check_time(time)?;
        let kf = Keyframe::new(time, properties, easing);
        match self
            .keyframes
            .binary_search_by(|probe| probe.time.total_cmp(&time))
        {
            Ok(i) => self.keyframes[i] = kf,
            Err(i) => self.keyframes.insert(i, kf),
        }
        Ok(())
    }

    /// Remove the keyframe at exactly `time`. Returns whether one was removed.
    pub fn remove(&mut self, time: f64) -> bool {
        match self
            .keyframes
            .binary_search_by(|probe| probe.time.total_cmp(&time))
        {
            Ok(i) => {
                self.keyframes.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Resolve the property state at `time`, starting from `base`.
    ///
    /// - before the first keyframe (or with none): `base` unchanged
    /// - after the last keyframe: `base` with the last keyframe applied
    /// - in between: `prev` applied, then every property of `next`
    ///   interpolated with `next.easing`; a property `prev` lacks starts
    ///   from its base value
    pub fn resolve(&self, base: &PropertyMap, time: f64) -> PropertyMap {
        let mut out = base.clone();
        let idx = self.keyframes.partition_point(|kf| kf.time <= time);
        let Some(prev) = idx.checked_sub(1).map(|i| &self.keyframes[i]) else {
            return out;
        };
        out.merge(&prev.properties);

        let Some(next) = self.keyframes.get(idx) else {
            return out;
        };

        let span = next.time - prev.time;
        let progress = if span > 0.0 {
            ((time - prev.time) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = next.easing.apply(progress);

        for (key, end) in next.properties.iter() {
            let value = match prev.properties.get(key).or_else(|| base.get(key)) {
                Some(start) => PropertyValue::interpolate(start, end, progress, eased),
                None => end.clone(),
            };
            out.set(key, value);
        }
        out
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn get(&self, time: f64) -> Option<&Keyframe> {
        self.keyframes
            .binary_search_by(|probe| probe.time.total_cmp(&time))
            .ok()
            .map(|i| &self.keyframes[i])
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Whether the track animates anything (more than one keyframe).
    pub fn is_animated(&self) -> bool {
        self.keyframes.len() > 1
    }

    /// Span from the first to the last keyframe.
    pub fn time_range(&self) -> Option<TimeRange> {
        match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => Some(TimeRange::new(first.time, last.time)),
            _ => None,
        }
    }
}

impl TryFrom<Vec<Keyframe>> for KeyframeTrack {
    type Error = ClipforgeError;

    fn try_from(keyframes: Vec<Keyframe>) -> Result<Self> {
        Self::from_keyframes(keyframes)
    }
}

impl From<KeyframeTrack> for Vec<Keyframe> {
    fn from(track: KeyframeTrack) -> Self {
        track.keyframes
    }
}

impl fmt::Display for KeyframeTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyframeTrack({} keyframes)", self.keyframes.len())
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn props(key: Property, v: f64) -> PropertyMap {
        PropertyMap::new().with(key, v)
    }

    fn left_track() -> KeyframeTrack {
        let mut track = KeyframeTrack::new();
        track.set(0.0, props(Property::X, 0.0), Easing::Linear).unwrap();
        track.set(10.0, props(Property::X, 100.0), Easing::Linear).unwrap();
        track
    }

    #[test]
    fn test_linear_interpolation() {
        let base = props(Property::X, 42.0);
        let track = left_track();
        assert_eq!(track.resolve(&base, 5.0).number(Property::X), Some(50.0));
    }

    #[test]
    fn test_before_first_keyframe_keeps_base() {
        let base = props(Property::X, 42.0).with(Property::Opacity, 1.0);
        let track = left_track();
        assert_eq!(track.resolve(&base, -1.0), base);
    }

    #[test]
    fn test_after_last_keyframe_holds() {
        let base = props(Property::X, 42.0);
        let track = left_track();
        assert_eq!(track.resolve(&base, 20.0).number(Property::X), Some(100.0));
    }

    #[test]
    fn test_empty_track_is_noop() {
        let base = props(Property::Y, 7.0);
        assert_eq!(KeyframeTrack::new().resolve(&base, 3.0), base);
    }

    #[test]
    fn test_easing_of_next_keyframe_applies() {
        let mut track = KeyframeTrack::new();
        track
            .set(0.0, props(Property::Opacity, 0.0), Easing::Linear)
            .unwrap();
        track
            .set(2.0, props(Property::Opacity, 1.0), Easing::EaseIn)
            .unwrap();
        let v = track
            .resolve(&PropertyMap::new(), 1.0)
            .number(Property::Opacity)
            .unwrap();
        assert!((v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_missing_prev_property_starts_from_base() {
        let mut track = KeyframeTrack::new();
        track.set(0.0, props(Property::X, 0.0), Easing::Linear).unwrap();
        track.set(4.0, props(Property::Y, 40.0), Easing::Linear).unwrap();
        let base = props(Property::Y, 20.0);
        let out = track.resolve(&base, 2.0);
        assert_eq!(out.number(Property::Y), Some(30.0));
        assert_eq!(out.number(Property::X), Some(0.0));
    }

    #[test]
    fn test_discrete_values_step_at_midpoint() {
        let mut track = KeyframeTrack::new();
        track
            .set(0.0, PropertyMap::new().with(Property::Fill, "#ff0000"), Easing::Linear)
            .unwrap();
        track
            .set(2.0, PropertyMap::new().with(Property::Fill, "#0000ff"), Easing::EaseIn)
            .unwrap();
        let at = |t| {
            track
                .resolve(&PropertyMap::new(), t)
                .get(Property::Fill)
                .and_then(|v| v.as_str().map(str::to_owned))
        };
        assert_eq!(at(0.9).as_deref(), Some("#ff0000"));
        assert_eq!(at(1.0).as_deref(), Some("#0000ff"));
    }

    #[test]
    fn test_keyframe_overwrite() {
        let mut track = KeyframeTrack::new();
        track.set(1.0, props(Property::X, 1.0), Easing::Linear).unwrap();
        track.set(1.0, props(Property::X, 5.0), Easing::EaseOut).unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track.keyframes()[0].easing, Easing::EaseOut);
        assert_eq!(track.get(1.0).unwrap().properties.number(Property::X), Some(5.0));
    }

    #[test]
    fn test_negative_time_rejected() {
        let mut track = left_track();
        assert!(track.set(-0.5, props(Property::X, 1.0), Easing::Linear).is_err());
        assert!(track.set(f64::NAN, props(Property::X, 1.0), Easing::Linear).is_err());
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_keyframe_remove() {
        let mut track = left_track();
        assert!(track.remove(10.0));
        assert_eq!(track.len(), 1);
        assert!(!track.remove(5.0));
    }

    #[test]
    fn test_deserialize_normalises_order() {
        let json = r#"[
            {"time": 2.0, "properties": {"x": 20.0}, "easing": "easeIn"},
            {"time": 0.0, "properties": {"x": 0.0}},
            {"time": 2.0, "properties": {"x": 99.0}, "easing": "linear"}
        ]"#;
        let track: KeyframeTrack = serde_json::from_str(json).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.keyframes()[0].time, 0.0);
        assert_eq!(track.keyframes()[1].properties.number(Property::X), Some(99.0));
        assert_eq!(track.time_range(), Some(TimeRange::new(0.0, 2.0)));
    }

    #[test]
    fn test_deserialize_rejects_negative_time() {
        let json = r#"[{"time": -1.0, "properties": {}}]"#;
        assert!(serde_json::from_str::<KeyframeTrack>(json).is_err());
    }

    #[test]
    fn test_property_map_json_shape() {
        let map = PropertyMap::new()
            .with(Property::Opacity, 0.5)
            .with(Property::ScaleX, 2.0);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"scaleX":2.0,"opacity":0.5}"#);
    }

    proptest! {
        #[test]
        fn prop_sorted_and_unique(times in proptest::collection::vec(0u16..50, 0..40)) {
            let mut track = KeyframeTrack::new();
            for (i, t) in times.iter().enumerate() {
                let t = *t as f64 / 4.0;
                track.set(t, props(Property::X, i as f64), Easing::Linear).unwrap();
            }
            let kfs = track.keyframes();
            prop_assert!(kfs.windows(2).all(|w| w[0].time < w[1].time));
        }

        #[test]
        fn prop_linear_value_within_endpoints(t in 0.0f64..10.0) {
            let v = left_track().resolve(&PropertyMap::new(), t).number(Property::X).unwrap();
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }
}
