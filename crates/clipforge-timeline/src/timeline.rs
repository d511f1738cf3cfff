//! The timeline: tracks, clips, audio events and overlay objects, plus the
//! mutation operations that keep them consistent.
//!
//! Invariants maintained by every operation:
//! - clips on one track are sorted by start and never overlap
//! - every clip satisfies `end > start >= 0`
//! - `duration()` is the latest clip/audio end, recomputed after each mutation
//! - locked tracks reject clip, audio and object mutations with
//!   [`TimelineError::TrackLocked`]
//! - removing an entity clears any selection that pointed at it

use clipforge_core::defaults::MIN_CLIP_DURATION;
use clipforge_core::{Easing, PropertyMap, PropertyValue, Property, TimeRange};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::audio::AudioEvent;
use crate::clip::Clip;
use crate::error::{Result, TimelineError};
use crate::overlay::{AnimatableObject, OverlayStore};
use crate::track::{Track, TrackKind};
use crate::transition::Transition;

/// Which edge of a clip a resize moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Current selection. Ids always refer to live entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub track: Option<Uuid>,
    pub clip: Option<Uuid>,
    pub object: Option<Uuid>,
}

/// A clip active at some time, with the track it sits on.
#[derive(Debug, Clone, Copy)]
pub struct ActiveClip<'a> {
    pub track: &'a Track,
    pub clip: &'a Clip,
}

/// Persisted shape of a timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimelineSnapshot {
    tracks: Vec<Track>,
    #[serde(default)]
    objects: OverlayStore,
}

/// The track/clip/audio/overlay model for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineSnapshot", into = "TimelineSnapshot")]
pub struct Timeline {
    tracks: Vec<Track>,
    objects: OverlayStore,
    duration: f64,
    selection: Selection,
}

fn check_finite(what: &str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TimelineError::InvalidTime(format!("{what} must be finite, got {v}")))
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Tracks in stacking order (later tracks draw on top).
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_index(&self, id: Uuid) -> Result<usize> {
        self.tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    fn track_mut(&mut self, id: Uuid) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    /// Mutable track that must be unlocked and of one of `kinds`.
    fn editable_track(&mut self, id: Uuid, kinds: &[TrackKind]) -> Result<&mut Track> {
        let track = self.track_mut(id)?;
        if track.locked {
            debug!(track = %id, "rejected edit on locked track");
            return Err(TimelineError::TrackLocked(id));
        }
        if !kinds.contains(&track.kind) {
            return Err(TimelineError::WrongTrackKind {
                track: id,
                expected: kinds[0],
                actual: track.kind,
            });
        }
        Ok(track)
    }

    /// Find a clip anywhere on the timeline.
    pub fn clip(&self, clip_id: Uuid) -> Option<&Clip> {
        self.tracks
            .iter()
            .find_map(|t| t.find_clip(clip_id).map(|(_, c)| c))
    }

    pub fn objects(&self) -> &OverlayStore {
        &self.objects
    }

    pub fn object(&self, id: Uuid) -> Option<&AnimatableObject> {
        self.objects.get(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ── Tracks ──────────────────────────────────────────────────

    /// Append a new empty track on top of the stack.
    pub fn add_track(&mut self, kind: TrackKind, name: impl Into<String>) -> Uuid {
        let track = Track::new(kind, name);
        let id = track.id;
        debug!(track = %id, %kind, "track added");
        self.tracks.push(track);
        id
    }

    /// Remove a track with everything on it.
    pub fn remove_track(&mut self, id: Uuid) -> Result<Track> {
        let idx = self.track_index(id)?;
        if self.tracks[idx].locked {
            return Err(TimelineError::TrackLocked(id));
        }
        let track = self.tracks.remove(idx);
        let removed_objects = self.objects.remove_track(id);

        if self.selection.track == Some(id) {
            self.selection.track = None;
        }
        if let Some(sel) = self.selection.clip {
            if track.clips.iter().any(|c| c.id == sel) {
                self.selection.clip = None;
            }
        }
        if let Some(sel) = self.selection.object {
            if removed_objects.contains(&sel) {
                self.selection.object = None;
            }
        }
        self.refresh_duration();
        debug!(track = %id, objects = removed_objects.len(), "track removed");
        Ok(track)
    }

    /// Move a track to `index` in the stacking order (clamped).
    pub fn reorder_track(&mut self, id: Uuid, index: usize) -> Result<()> {
        let from = self.track_index(id)?;
        let track = self.tracks.remove(from);
        let to = index.min(self.tracks.len());
        self.tracks.insert(to, track);
        Ok(())
    }

    pub fn set_track_locked(&mut self, id: Uuid, locked: bool) -> Result<()> {
        self.track_mut(id)?.locked = locked;
        Ok(())
    }

    /// Show/hide (video, overlay) or mute/unmute (audio).
    pub fn set_track_visible(&mut self, id: Uuid, visible: bool) -> Result<()> {
        self.track_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn rename_track(&mut self, id: Uuid, name: impl Into<String>) -> Result<()> {
        self.track_mut(id)?.name = name.into();
        Ok(())
    }

    // ── Clips ───────────────────────────────────────────────────

    /// Place a clip on a video or overlay track.
    ///
    /// A nil clip id is replaced with a fresh one. Placement overlapping an
    /// existing clip is rejected.
    pub fn add_clip(&mut self, track_id: Uuid, mut clip: Clip) -> Result<Uuid> {
        check_finite("clip start", clip.start)?;
        check_finite("clip end", clip.end)?;
        if clip.start < 0.0 || clip.end <= clip.start {
            return Err(TimelineError::InvalidTime(format!(
                "clip bounds [{}, {}) must satisfy 0 <= start < end",
                clip.start, clip.end
            )));
        }
        if let Some(t) = clip.transition.as_ref() {
            check_transition(t)?;
        }

        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        if let Some(existing) = track.overlapping(clip.range(), None) {
            return Err(overlap(track_id, existing.id, clip.range()));
        }

        if clip.id.is_nil() {
            clip.id = Uuid::new_v4();
        }
        clip.track_id = track_id;
        let id = clip.id;
        debug!(track = %track_id, clip = %id, start = clip.start, end = clip.end, "clip added");
        track.insert_clip_sorted(clip);
        self.refresh_duration();
        Ok(id)
    }

    pub fn remove_clip(&mut self, track_id: Uuid, clip_id: Uuid) -> Result<Clip> {
        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        let (idx, _) = track
            .find_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        let clip = track.clips.remove(idx);
        if self.selection.clip == Some(clip_id) {
            self.selection.clip = None;
        }
        self.refresh_duration();
        debug!(track = %track_id, clip = %clip_id, "clip removed");
        Ok(clip)
    }

    /// Move a clip so it starts at `new_start` (clamped to 0), preserving its
    /// duration. Returns the applied range.
    pub fn move_clip(&mut self, track_id: Uuid, clip_id: Uuid, new_start: f64) -> Result<TimeRange> {
        check_finite("clip start", new_start)?;
        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        let (_, clip) = track
            .find_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;

        let start = new_start.max(0.0);
        let target = TimeRange::new(start, start + clip.duration());
        self.apply_clip_range(track_id, clip_id, target)
    }

    /// Move one edge of a clip, keeping the other fixed.
    ///
    /// The left edge is clamped to `[0, end - MIN_CLIP_DURATION]` (never past
    /// the current start for a clip already shorter than that), the right
    /// edge to at least `start + MIN_CLIP_DURATION`.
    pub fn resize_clip(
        &mut self,
        track_id: Uuid,
        clip_id: Uuid,
        edge: Edge,
        bound: f64,
    ) -> Result<TimeRange> {
        check_finite("clip bound", bound)?;
        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        let (_, clip) = track
            .find_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;

        let target = match edge {
            Edge::Left => {
                // a clip already shorter than the minimum keeps its start
            let latest = (clip.end - MIN_CLIP_DURATION).max(clip.start);
            let start = bound.min(latest).max(0.0);
                TimeRange::new(start, clip.end)
            }
            Edge::Right => {
                let end = bound.max(clip.start + MIN_CLIP_DURATION);
                TimeRange::new(clip.start, end)
            }
        };
        self.apply_clip_range(track_id, clip_id, target)
    }

    /// Overlap-check and commit new bounds for a clip on an editable track.
    fn apply_clip_range(&mut self, track_id: Uuid, clip_id: Uuid, target: TimeRange) -> Result<TimeRange> {
        let track = self.track_mut(track_id)?;
        if let Some(existing) = track.overlapping(target, Some(clip_id)) {
            return Err(overlap(track_id, existing.id, target));
        }
        let (_, clip) = track
            .find_clip_mut(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        clip.start = target.start;
        clip.end = target.end;
        track.sort_clips();
        self.refresh_duration();
        debug!(track = %track_id, clip = %clip_id, range = %target, "clip bounds updated");
        Ok(target)
    }

    /// Attach (or clear with `None`) the inbound transition of a clip.
    pub fn set_transition(
        &mut self,
        track_id: Uuid,
        clip_id: Uuid,
        transition: Option<Transition>,
    ) -> Result<()> {
        if let Some(t) = transition.as_ref() {
            check_transition(t)?;
        }
        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        let (_, clip) = track
            .find_clip_mut(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        clip.transition = transition;
        Ok(())
    }

    pub fn rename_clip(&mut self, track_id: Uuid, clip_id: Uuid, name: impl Into<String>) -> Result<()> {
        let track = self.editable_track(track_id, &[TrackKind::Video, TrackKind::Overlay])?;
        let (_, clip) = track
            .find_clip_mut(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        clip.name = name.into();
        Ok(())
    }

    // ── Audio ───────────────────────────────────────────────────

    pub fn add_audio_event(&mut self, track_id: Uuid, mut event: AudioEvent) -> Result<Uuid> {
        check_audio_event(&event)?;
        let track = self.editable_track(track_id, &[TrackKind::Audio])?;
        if event.id.is_nil() {
            event.id = Uuid::new_v4();
        }
        event.volume = event.volume.clamp(0.0, 1.0);
        let id = event.id;
        debug!(track = %track_id, event = %id, kind = ?event.kind, "audio event added");
        track.audio.push(event);
        self.refresh_duration();
        Ok(id)
    }

    pub fn remove_audio_event(&mut self, track_id: Uuid, event_id: Uuid) -> Result<AudioEvent> {
        let track = self.editable_track(track_id, &[TrackKind::Audio])?;
        let (idx, _) = track
            .find_audio(event_id)
            .ok_or(TimelineError::AudioEventNotFound(event_id))?;
        let event = track.audio.remove(idx);
        self.refresh_duration();
        Ok(event)
    }

    /// Move an audio event to `new_start` (clamped to 0).
    pub fn move_audio_event(&mut self, track_id: Uuid, event_id: Uuid, new_start: f64) -> Result<()> {
        check_finite("audio start", new_start)?;
        let track = self.editable_track(track_id, &[TrackKind::Audio])?;
        let (_, event) = track
            .find_audio_mut(event_id)
            .ok_or(TimelineError::AudioEventNotFound(event_id))?;
        event.start = new_start.max(0.0);
        self.refresh_duration();
        Ok(())
    }

    /// Update volume (clamped to `[0, 1]`) and fades (clamped to `>= 0`).
    pub fn set_audio_envelope(
        &mut self,
        track_id: Uuid,
        event_id: Uuid,
        volume: f64,
        fade_in: f64,
        fade_out: f64,
    ) -> Result<()> {
        let track = self.editable_track(track_id, &[TrackKind::Audio])?;
        let (_, event) = track
            .find_audio_mut(event_id)
            .ok_or(TimelineError::AudioEventNotFound(event_id))?;
        event.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        event.fade_in = if fade_in.is_nan() { 0.0 } else { fade_in.max(0.0) };
        event.fade_out = if fade_out.is_nan() { 0.0 } else { fade_out.max(0.0) };
        Ok(())
    }

    // ── Overlay objects ─────────────────────────────────────────

    /// Put an object on an overlay track, on top of existing objects.
    pub fn add_object(&mut self, track_id: Uuid, mut object: AnimatableObject) -> Result<Uuid> {
        self.editable_track(track_id, &[TrackKind::Overlay])?;
        if object.id.is_nil() {
            object.id = Uuid::new_v4();
        }
        object.track_id = track_id;
        let id = object.id;
        debug!(track = %track_id, object = %id, "overlay object added");
        self.objects.insert(object);
        Ok(id)
    }

    /// Track id of an object whose track is editable.
    fn editable_object_track(&mut self, object_id: Uuid) -> Result<Uuid> {
        let track_id = self
            .objects
            .get(object_id)
            .map(|o| o.track_id)
            .ok_or(TimelineError::ObjectNotFound(object_id))?;
        self.editable_track(track_id, &[TrackKind::Overlay])?;
        Ok(track_id)
    }

    pub fn remove_object(&mut self, object_id: Uuid) -> Result<AnimatableObject> {
        self.editable_object_track(object_id)?;
        let object = self
            .objects
            .remove(object_id)
            .ok_or(TimelineError::ObjectNotFound(object_id))?;
        if self.selection.object == Some(object_id) {
            self.selection.object = None;
        }
        Ok(object)
    }

    /// Remove every object on an overlay track. Returns how many were removed.
    pub fn clear_objects(&mut self, track_id: Uuid) -> Result<usize> {
        self.editable_track(track_id, &[TrackKind::Overlay])?;
        let removed = self.objects.remove_track(track_id);
        if let Some(sel) = self.selection.object {
            if removed.contains(&sel) {
                self.selection.object = None;
            }
        }
        Ok(removed.len())
    }

    /// Change one static (non-keyframed) property of an object.
    pub fn set_base_property(
        &mut self,
        object_id: Uuid,
        property: Property,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.editable_object_track(object_id)?;
        let object = self
            .objects
            .get_mut(object_id)
            .ok_or(TimelineError::ObjectNotFound(object_id))?;
        object.base.set(property, value);
        Ok(())
    }

    /// Insert or replace the keyframe at `time` on an object.
    pub fn set_keyframe(
        &mut self,
        object_id: Uuid,
        time: f64,
        properties: PropertyMap,
        easing: Easing,
    ) -> Result<()> {
        self.editable_object_track(object_id)?;
        let object = self
            .objects
            .get_mut(object_id)
            .ok_or(TimelineError::ObjectNotFound(object_id))?;
        object.set_keyframe(time, properties, easing)?;
        debug!(object = %object_id, time, %easing, "keyframe set");
        Ok(())
    }

    /// Remove the keyframe at exactly `time`. `Ok(false)` when none exists.
    pub fn remove_keyframe(&mut self, object_id: Uuid, time: f64) -> Result<bool> {
        self.editable_object_track(object_id)?;
        let object = self
            .objects
            .get_mut(object_id)
            .ok_or(TimelineError::ObjectNotFound(object_id))?;
        Ok(object.keyframes.remove(time))
    }

    /// Property state of an object at `t`.
    pub fn resolve_object(&self, object_id: Uuid, t: f64) -> Option<PropertyMap> {
        self.objects.get(object_id).map(|o| o.resolve(t))
    }

    /// Objects on visible overlay tracks, in stacking order.
    pub fn visible_objects(&self) -> impl Iterator<Item = &AnimatableObject> {
        self.objects.iter().filter(move |o| {
            self.track(o.track_id)
                .is_some_and(|t| t.visible && t.kind == TrackKind::Overlay)
        })
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Latest end over all clips and audio events.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn refresh_duration(&mut self) {
        self.duration = self.tracks.iter().map(Track::end_time).fold(0.0, f64::max);
    }

    /// Clips active at `t` on visible video and overlay tracks, bottom track first.
    pub fn active_clips(&self, t: f64) -> Vec<ActiveClip<'_>> {
        self.tracks
            .iter()
            .filter(|track| track.visible && track.kind != TrackKind::Audio)
            .filter_map(|track| track.clip_at(t).map(|clip| ActiveClip { track, clip }))
            .collect()
    }

    pub fn clip_at(&self, track_id: Uuid, t: f64) -> Option<&Clip> {
        self.track(track_id).and_then(|track| track.clip_at(t))
    }

    /// The clip directly before `clip` on the same track.
    pub fn preceding_clip(&self, clip: &Clip) -> Option<&Clip> {
        self.track(clip.track_id)
            .and_then(|track| track.preceding_clip(clip))
    }

    /// Audible events at `t` with their envelope gain.
    pub fn audio_mix_at(&self, t: f64) -> Vec<(&AudioEvent, f64)> {
        self.tracks
            .iter()
            .filter(|track| track.visible && track.kind == TrackKind::Audio)
            .flat_map(|track| track.audio.iter())
            .map(|event| (event, event.gain_at(t)))
            .filter(|(_, gain)| *gain > 0.0)
            .collect()
    }

    // ── Selection ───────────────────────────────────────────────

    pub fn select_track(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            self.track_index(id)?;
        }
        self.selection.track = id;
        Ok(())
    }

    pub fn select_clip(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            self.clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        }
        self.selection.clip = id;
        Ok(())
    }

    pub fn select_object(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            if !self.objects.contains(id) {
                return Err(TimelineError::ObjectNotFound(id));
            }
        }
        self.selection.object = id;
        Ok(())
    }

    // ── Validation ──────────────────────────────────────────────

    /// Check structural invariants of a loaded timeline and normalise clip order.
    fn validated(mut tracks: Vec<Track>, objects: OverlayStore) -> Result<Self> {
        for track in &mut tracks {
            if track.kind == TrackKind::Audio && !track.clips.is_empty() {
                return Err(TimelineError::WrongTrackKind {
                    track: track.id,
                    expected: TrackKind::Video,
                    actual: TrackKind::Audio,
                });
            }
            if track.kind != TrackKind::Audio && !track.audio.is_empty() {
                return Err(TimelineError::WrongTrackKind {
                    track: track.id,
                    expected: TrackKind::Audio,
                    actual: track.kind,
                });
            }
            for event in &mut track.audio {
                check_audio_event(event)?;
                event.volume = event.volume.clamp(0.0, 1.0);
            }
            for clip in &track.clips {
                if clip.track_id != track.id {
                    return Err(TimelineError::InvalidTime(format!(
                        "clip {} claims track {} but sits on {}",
                        clip.id, clip.track_id, track.id
                    )));
                }
                let bounds_ok = clip.start.is_finite()
                    && clip.end.is_finite()
                    && clip.start >= 0.0
                    && clip.end > clip.start;
                if !bounds_ok {
                    return Err(TimelineError::InvalidTime(format!(
                        "clip {} has invalid bounds [{}, {})",
                        clip.id, clip.start, clip.end
                    )));
                }
            }
            track.sort_clips();
            if let Some(pair) = track.clips.windows(2).find(|w| w[0].range().overlaps(w[1].range())) {
                return Err(overlap(track.id, pair[0].id, pair[1].range()));
            }
        }

        for object in objects.iter() {
            let track = tracks
                .iter()
                .find(|t| t.id == object.track_id)
                .ok_or(TimelineError::TrackNotFound(object.track_id))?;
            if track.kind != TrackKind::Overlay {
                return Err(TimelineError::WrongTrackKind {
                    track: track.id,
                    expected: TrackKind::Overlay,
                    actual: track.kind,
                });
            }
        }

        let mut timeline = Self {
            tracks,
            objects,
            duration: 0.0,
            selection: Selection::default(),
        };
        timeline.refresh_duration();
        Ok(timeline)
    }
}

fn check_audio_event(event: &AudioEvent) -> Result<()> {
    check_finite("audio start", event.start)?;
    check_finite("audio duration", event.duration)?;
    check_finite("audio volume", event.volume)?;
    check_finite("audio fade in", event.fade_in)?;
    check_finite("audio fade out", event.fade_out)?;
    if event.start < 0.0 || event.duration <= 0.0 {
        return Err(TimelineError::InvalidTime(format!(
            "audio event needs start >= 0 and duration > 0, got start {} duration {}",
            event.start, event.duration
        )));
    }
    if event.fade_in < 0.0 || event.fade_out < 0.0 {
        return Err(TimelineError::InvalidTime(format!(
            "audio fades must be >= 0, got in {} out {}",
            event.fade_in, event.fade_out
        )));
    }
    Ok(())
}

fn check_transition(t: &Transition) -> Result<()> {
    if t.is_valid() {
        Ok(())
    } else {
        Err(TimelineError::InvalidTime(format!(
            "transition duration must be > 0, got {}",
            t.duration
        )))
    }
}

fn overlap(track: Uuid, existing: Uuid, range: TimeRange) -> TimelineError {
    debug!(%track, %existing, %range, "rejected overlapping placement");
    TimelineError::Overlap {
        track,
        existing,
        start: range.start,
        end: range.end,
    }
}

impl TryFrom<TimelineSnapshot> for Timeline {
    type Error = TimelineError;

    fn try_from(snapshot: TimelineSnapshot) -> Result<Self> {
        Self::validated(snapshot.tracks, snapshot.objects)
    }
}

impl From<Timeline> for TimelineSnapshot {
    fn from(timeline: Timeline) -> Self {
        Self {
            tracks: timeline.tracks,
            objects: timeline.objects,
        }
    }
}
