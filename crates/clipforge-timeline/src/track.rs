//! Track types for the timeline.

use clipforge_core::TimeRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::audio::AudioEvent;
use crate::clip::Clip;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    /// Vector canvas overlay (text, shapes, images).
    #[serde(alias = "canvas")]
    Overlay,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Overlay => "overlay",
            Self::Audio => "audio",
        })
    }
}

/// A track holding clips (video/overlay) or audio events (audio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub name: String,
    pub kind: TrackKind,
    /// Sorted by start time, never overlapping.
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// Audio events; may overlap.
    #[serde(default)]
    pub audio: Vec<AudioEvent>,
    /// Is track locked (reject edits)
    #[serde(default)]
    pub locked: bool,
    /// Visible (video/overlay) or audible (audio)
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            audio: Vec::new(),
            locked: false,
            visible: true,
        }
    }

    pub fn new_video(name: impl Into<String>) -> Self {
        Self::new(TrackKind::Video, name)
    }

    pub fn new_overlay(name: impl Into<String>) -> Self {
        Self::new(TrackKind::Overlay, name)
    }

    pub fn new_audio(name: impl Into<String>) -> Self {
        Self::new(TrackKind::Audio, name)
    }

    /// Latest end time of anything on this track.
    pub fn end_time(&self) -> f64 {
        let clips = self.clips.iter().map(|c| c.end);
        let audio = self.audio.iter().map(AudioEvent::end);
        clips.chain(audio).fold(0.0, f64::max)
    }

    /// Find a clip by UUID. Returns (index, &Clip).
    pub fn find_clip(&self, id: Uuid) -> Option<(usize, &Clip)> {
        self.clips.iter().enumerate().find(|(_, c)| c.id == id)
    }

    /// Find a clip mutably by UUID. Returns (index, &mut Clip).
    pub fn find_clip_mut(&mut self, id: Uuid) -> Option<(usize, &mut Clip)> {
        self.clips.iter_mut().enumerate().find(|(_, c)| c.id == id)
    }

    pub fn find_audio(&self, id: Uuid) -> Option<(usize, &AudioEvent)> {
        self.audio.iter().enumerate().find(|(_, e)| e.id == id)
    }

    pub fn find_audio_mut(&mut self, id: Uuid) -> Option<(usize, &mut AudioEvent)> {
        self.audio.iter_mut().enumerate().find(|(_, e)| e.id == id)
    }

    /// The clip active at `t`, if any.
    pub fn clip_at(&self, t: f64) -> Option<&Clip> {
        let idx = self.clips.partition_point(|c| c.start <= t);
        idx.checked_sub(1)
            .map(|i| &self.clips[i])
            .filter(|c| c.is_active_at(t))
    }

    /// The clip ending at or before `clip`'s start, closest to it.
    pub fn preceding_clip(&self, clip: &Clip) -> Option<&Clip> {
        self.clips
            .iter()
            .filter(|c| c.id != clip.id && c.end <= clip.start)
            .max_by(|a, b| a.end.total_cmp(&b.end))
    }

    /// First clip (other than `exclude`) overlapping `range`.
    pub fn overlapping(&self, range: TimeRange, exclude: Option<Uuid>) -> Option<&Clip> {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .find(|c| c.range().overlaps(range))
    }

    /// Insert keeping clips sorted by start.
    pub(crate) fn insert_clip_sorted(&mut self, clip: Clip) {
        let pos = self.clips.partition_point(|c| c.start <= clip.start);
        self.clips.insert(pos, clip);
    }

    pub(crate) fn sort_clips(&mut self) {
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    /// Number of clips in this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}
