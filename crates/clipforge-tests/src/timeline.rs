//! Integration tests for the timeline model and its persistence.
//!
//! Exercises clipforge-core keyframes and easing through
//! clipforge-timeline's editing API and project files.

use clipforge_core::{Easing, FrameRate, Property, PropertyMap};
use clipforge_render::{transition_filters, ExportRequest};
use clipforge_timeline::{
    preset_by_id, AnimatableObject, AudioEvent, AudioKind, Clip, Edge, MediaRef, OverlayKind,
    Project, ProjectFile, TimelineError, TrackKind,
};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn clip(name: &str, start: f64, end: f64) -> Clip {
    Clip::new(MediaRef::new(format!("media/{name}.mp4")), start, end).with_name(name)
}

struct Fixture {
    project: Project,
    video: Uuid,
    overlay: Uuid,
    audio: Uuid,
    clips: Vec<Uuid>,
}

fn build_project() -> Fixture {
    let mut project = Project::new("Integration Test Project");
    let tl = &mut project.timeline;
    let video = tl.add_track(TrackKind::Video, "Main");
    let overlay = tl.add_track(TrackKind::Overlay, "Titles");
    let audio = tl.add_track(TrackKind::Audio, "Music");

    let clips = vec![
        tl.add_clip(video, clip("Intro", 0.0, 5.0)).unwrap(),
        tl.add_clip(video, clip("Body", 5.0, 35.0)).unwrap(),
        tl.add_clip(video, clip("Outro", 35.0, 45.0)).unwrap(),
    ];
    tl.add_audio_event(
        audio,
        AudioEvent::new(AudioKind::Music, MediaRef::new("bed.mp3"), 0.0, 40.0).with_fades(2.0, 4.0),
    )
    .unwrap();
    Fixture {
        project,
        video,
        overlay,
        audio,
        clips,
    }
}

// ── Assembly & timing ──────────────────────────────────────────

#[test]
fn project_duration_is_max_of_clips_and_audio() {
    let mut f = build_project();
    assert_eq!(f.project.duration(), 45.0);

    let tl = &mut f.project.timeline;
    let bed = tl.tracks()[2].audio[0].id;
    tl.move_audio_event(f.audio, bed, 20.0).unwrap();
    assert_eq!(tl.duration(), 60.0);
}

#[test]
fn removing_longest_clip_shrinks_duration() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    let bed = tl.tracks()[2].audio[0].id;
    tl.remove_audio_event(f.audio, bed).unwrap();
    tl.remove_clip(f.video, f.clips[2]).unwrap();
    assert_eq!(tl.duration(), 35.0);
}

#[test]
fn clip_at_finds_correct_clip() {
    let f = build_project();
    let tl = &f.project.timeline;
    assert_eq!(tl.clip_at(f.video, 0.0).unwrap().name, "Intro");
    assert_eq!(tl.clip_at(f.video, 5.0).unwrap().name, "Body");
    assert_eq!(tl.clip_at(f.video, 44.999).unwrap().name, "Outro");
    assert!(tl.clip_at(f.video, 45.0).is_none());
}

// ── Editing rules ──────────────────────────────────────────────

#[test]
fn overlapping_placement_is_rejected() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    let err = tl.add_clip(f.video, clip("Extra", 4.0, 6.0)).unwrap_err();
    assert!(matches!(err, TimelineError::Overlap { existing, .. } if existing == f.clips[0]));

    let err = tl.move_clip(f.video, f.clips[2], 30.0).unwrap_err();
    assert!(matches!(err, TimelineError::Overlap { .. }));
    assert_eq!(tl.clip(f.clips[2]).unwrap().start, 35.0);
}

#[test]
fn right_edge_resize_clamps_to_minimum_duration() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    let range = tl.resize_clip(f.video, f.clips[0], Edge::Right, -3.0).unwrap();
    assert_eq!(range.end, 0.1);
    assert_eq!(tl.clip(f.clips[0]).unwrap().duration(), 0.1);
}

#[test]
fn locked_track_rejects_every_clip_edit() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    tl.set_track_locked(f.video, true).unwrap();

    let locked = |r: Result<(), TimelineError>| matches!(r, Err(TimelineError::TrackLocked(_)));
    assert!(locked(tl.add_clip(f.video, clip("Late", 50.0, 51.0)).map(|_| ())));
    assert!(locked(tl.remove_clip(f.video, f.clips[0]).map(|_| ())));
    assert!(locked(tl.move_clip(f.video, f.clips[0], 100.0).map(|_| ())));
    assert!(locked(tl.resize_clip(f.video, f.clips[0], Edge::Left, 1.0).map(|_| ())));
    assert!(locked(tl.set_transition(f.video, f.clips[1], None)));
    assert!(locked(tl.remove_track(f.video).map(|_| ())));
    assert_eq!(tl.tracks()[0].clips.len(), 3);

    tl.set_track_locked(f.video, false).unwrap();
    assert!(tl.move_clip(f.video, f.clips[2], 50.0).is_ok());
}

#[test]
fn removing_selected_clip_clears_selection() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    tl.select_clip(Some(f.clips[1])).unwrap();
    tl.remove_clip(f.video, f.clips[1]).unwrap();
    assert_eq!(tl.selection().clip, None);
}

#[test]
fn audio_mix_applies_fade_envelope() {
    let f = build_project();
    let tl = &f.project.timeline;
    let mix = tl.audio_mix_at(1.0);
    assert_eq!(mix.len(), 1);
    assert!((mix[0].1 - 0.5).abs() < 1e-12);
    assert!((tl.audio_mix_at(38.0)[0].1 - 0.5).abs() < 1e-12);
    assert!(tl.audio_mix_at(41.0).is_empty());
}

// ── Transitions ────────────────────────────────────────────────

#[test]
fn presets_attach_and_describe_for_export() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    let wipe = preset_by_id("wipe-up").unwrap().transition;
    let crossfade = preset_by_id("crossfade").unwrap().transition;
    tl.set_transition(f.video, f.clips[1], Some(wipe)).unwrap();
    tl.set_transition(f.video, f.clips[2], Some(crossfade)).unwrap();

    let filters = transition_filters(tl);
    assert_eq!(
        filters,
        vec![
            (f.clips[1], "xfade=transition=wipeup:duration=0.5:offset=0".to_string()),
            (f.clips[2], "fade=t=in:st=0:d=1:alpha=1".to_string()),
        ]
    );
}

// ── Serialization roundtrip ────────────────────────────────────

#[test]
fn project_survives_serialization_roundtrip() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    tl.set_transition(f.video, f.clips[1], preset_by_id("dissolve").map(|p| p.transition))
        .unwrap();
    let obj = tl
        .add_object(
            f.overlay,
            AnimatableObject::new(OverlayKind::Text {
                content: "Hello".into(),
                font_size: 64.0,
            }),
        )
        .unwrap();
    tl.set_keyframe(obj, 3.0, PropertyMap::new().with(Property::X, 300.0), Easing::EaseOut)
        .unwrap();
    tl.set_keyframe(obj, 0.0, PropertyMap::new().with(Property::X, 0.0), Easing::Linear)
        .unwrap();

    let json = ProjectFile::new(f.project.clone()).to_json().unwrap();
    let loaded = ProjectFile::from_json(&json).unwrap().project;

    assert_eq!(loaded, f.project);
    let names: Vec<&str> = loaded.timeline.tracks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Main", "Titles", "Music"]);
    let x = loaded.timeline.resolve_object(obj, 1.5).unwrap();
    // easeOut(0.5) = 0.75
    assert_eq!(x.number(Property::X), Some(225.0));
}

#[test]
fn persisted_json_has_no_cache_and_sorted_keyframes() {
    let mut f = build_project();
    let tl = &mut f.project.timeline;
    let obj = tl
        .add_object(
            f.overlay,
            AnimatableObject::new(OverlayKind::Text {
                content: "x".into(),
                font_size: 10.0,
            }),
        )
        .unwrap();
    for t in [4.0, 1.0, 2.0, 1.0] {
        tl.set_keyframe(obj, t, PropertyMap::new().with(Property::Opacity, t), Easing::Linear)
            .unwrap();
    }

    let json = ProjectFile::new(f.project).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    let times: Vec<f64> = value["project"]["timeline"]["objects"][0]["keyframes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["time"].as_f64().unwrap())
        .collect();
    assert_eq!(times, vec![1.0, 2.0, 4.0]);
    assert!(!String::from_utf8_lossy(&json).contains("cache"));
}

#[test]
fn export_frame_count_matches_duration() {
    let f = build_project();
    let req = ExportRequest::whole(&f.project.timeline, FrameRate::FPS_30);
    assert_eq!(req.total_frames(), 45 * 30);
    assert_eq!(req.frame_times()[30], 1.0);
}
