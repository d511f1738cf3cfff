//! End-to-end: a 10 s project with one clip and one fading overlay,
//! rendered through a session at t = 1 for every easing.

use clipforge_core::{Color, Easing, Property, PropertyMap};
use clipforge_playback::{EditSession, SessionConfig};
use clipforge_render::BoxOverlayRenderer;
use clipforge_timeline::{AnimatableObject, Clip, MediaRef, OverlayKind, Project, Shape, TrackKind};
use uuid::Uuid;

use crate::support::{logged, new_log, RecordingRenderer, SolidMedia};

fn ten_second_project(easing: Easing) -> (Project, Uuid) {
    let mut project = Project::new("Fade-in title");
    project.settings.width = 16;
    project.settings.height = 16;
    let tl = &mut project.timeline;

    let video = tl.add_track(TrackKind::Video, "Video");
    tl.add_clip(video, Clip::new(MediaRef::new("#000000"), 0.0, 10.0))
        .unwrap();

    let overlay = tl.add_track(TrackKind::Overlay, "Titles");
    let obj = tl
        .add_object(
            overlay,
            AnimatableObject::new(OverlayKind::Shape {
                shape: Shape::Rect {
                    width: 16.0,
                    height: 16.0,
                },
            }),
        )
        .unwrap();
    tl.set_keyframe(obj, 0.0, PropertyMap::new().with(Property::Opacity, 0.0), Easing::Linear)
        .unwrap();
    tl.set_keyframe(obj, 2.0, PropertyMap::new().with(Property::Opacity, 1.0), easing)
        .unwrap();
    (project, obj)
}

#[test]
fn overlay_opacity_at_one_second_follows_keyframe_easing() {
    let cases = [
        (Easing::Linear, 0.5),
        (Easing::EaseIn, 0.25),
        (Easing::EaseOut, 0.75),
        (Easing::EaseInOut, 0.5),
    ];
    for (easing, expected) in cases {
        let (project, obj) = ten_second_project(easing);
        assert_eq!(project.duration(), 10.0);

        let log = new_log();
        let mut session = EditSession::new(
            project,
            SessionConfig::default(),
            Box::new(SolidMedia::default()),
            Box::new(RecordingRenderer { log: log.clone() }),
        );
        let frame = session.seek(1.0);

        let draws = logged(&log);
        assert_eq!(draws.len(), 1, "{easing}");
        assert_eq!(draws[0].0, obj);
        assert!(
            (draws[0].1 - expected).abs() < 1e-12,
            "{easing}: opacity {} != {expected}",
            draws[0].1
        );

        // white at `expected` over the black video layer
        let px = frame.pixel(8, 8).unwrap();
        let want = (255.0 * expected).round() as i32;
        assert!((px.r as i32 - want).abs() <= 2, "{easing}: r {} vs {want}", px.r);
        assert_eq!(px.a, 255);
    }
}

#[test]
fn overlay_is_invisible_at_start_and_held_after_last_keyframe() {
    let (project, _) = ten_second_project(Easing::EaseIn);
    let mut session = EditSession::new(
        project,
        SessionConfig::default(),
        Box::new(SolidMedia::default()),
        Box::new(BoxOverlayRenderer),
    );
    assert_eq!(session.seek(0.0).pixel(3, 3), Some(Color::BLACK));
    assert_eq!(session.seek(5.0).pixel(3, 3), Some(Color::WHITE));
    assert_eq!(session.seek(9.99).pixel(3, 3), Some(Color::WHITE));
}

#[test]
fn repeated_render_at_same_time_is_a_cache_hit() {
    let (project, _) = ten_second_project(Easing::Linear);
    let log = new_log();
    let mut session = EditSession::new(
        project,
        SessionConfig::default(),
        Box::new(SolidMedia::default()),
        Box::new(RecordingRenderer { log: log.clone() }),
    );
    let a = session.seek(1.0);
    let b = session.seek(1.0);
    assert_eq!(a, b);
    // second seek never reached the overlay renderer
    assert_eq!(logged(&log).len(), 1);
    assert_eq!(session.cache_stats().hits, 1);
}
