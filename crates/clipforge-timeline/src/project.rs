//! Project and settings types.

use clipforge_core::{defaults, Color, FrameRate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timeline::Timeline;
use crate::track::TrackKind;

/// Output settings persisted with a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
}

impl ProjectSettings {
    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::fps(self.fps.max(1))
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            fps: defaults::FPS,
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
            background_color: Color::BLACK,
        }
    }
}

/// A project: identity, output settings and one timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub settings: ProjectSettings,
    pub timeline: Timeline,
}

impl Project {
    /// Create a new empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            settings: ProjectSettings::default(),
            timeline: Timeline::new(),
        }
    }

    /// New project with one video, one overlay and one audio track.
    pub fn with_default_tracks(name: impl Into<String>) -> Self {
        let mut project = Self::new(name);
        project.timeline.add_track(TrackKind::Video, "Video 1");
        project.timeline.add_track(TrackKind::Overlay, "Overlay 1");
        project.timeline.add_track(TrackKind::Audio, "Audio 1");
        project
    }

    pub fn duration(&self) -> f64 {
        self.timeline.duration()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled Project")
    }
}
