//! Clipforge Timeline - Timeline data model
//!
//! Implements the structure an editing session works on:
//! - Projects with output settings and one timeline
//! - Video, overlay and audio tracks
//! - Clips with inbound transitions, audio events with fade envelopes
//! - Overlay objects with keyframed properties
//! - Versioned JSON persistence

pub mod audio;
pub mod clip;
pub mod error;
pub mod overlay;
pub mod project;
pub mod serialization;
pub mod timeline;
pub mod track;
pub mod transition;

pub use audio::{AudioEvent, AudioKind};
pub use clip::{Clip, MediaRef};
pub use error::{Result, TimelineError};
pub use overlay::{AnimatableObject, OverlayKind, OverlayStore, Shape};
pub use project::{Project, ProjectSettings};
pub use serialization::ProjectFile;
pub use timeline::{ActiveClip, Edge, Selection, Timeline};
pub use track::{Track, TrackKind};
pub use transition::{preset_by_id, Transition, TransitionKind, TransitionPreset, WipeDirection, PRESETS};
