//! Playback integration: clock-driven ticks through a session, deferred
//! renders racing seeks, and edits invalidating what was cached.

use clipforge_core::Color;
use clipforge_playback::{EditSession, PlaybackClock, PlaybackState, SessionConfig, Tick};
use clipforge_render::BoxOverlayRenderer;
use clipforge_timeline::{Clip, MediaRef, Project, TrackKind};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::support::SolidMedia;

/// Red for [0, 2), blue for [2, 4).
fn two_clip_session() -> (EditSession, Uuid) {
    let mut project = Project::new("Playback");
    project.settings.width = 8;
    project.settings.height = 8;
    let tl = &mut project.timeline;
    let video = tl.add_track(TrackKind::Video, "Video");
    tl.add_clip(video, Clip::new(MediaRef::new("#ff0000"), 0.0, 2.0))
        .unwrap();
    tl.add_clip(video, Clip::new(MediaRef::new("#0000ff"), 2.0, 4.0))
        .unwrap();
    let session = EditSession::new(
        project,
        SessionConfig::default(),
        Box::new(SolidMedia::default()),
        Box::new(BoxOverlayRenderer),
    );
    (session, video)
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

#[test]
fn ticks_follow_wall_clock_and_present_frames() {
    let (mut session, _) = two_clip_session();
    let t0 = Instant::now();
    session.play(t0);
    assert_eq!(session.state(), PlaybackState::Playing);

    let frame = session.tick(t0 + secs(0.5)).unwrap();
    assert_eq!(session.current_time(), 0.5);
    assert_eq!(frame.pixel(4, 4), Some(Color::RED));

    let frame = session.tick(t0 + secs(2.5)).unwrap();
    assert_eq!(session.current_time(), 2.5);
    assert_eq!(frame.pixel(4, 4), Some(Color::BLUE));
    assert_eq!(session.current_frame(), Some(&frame));
}

#[test]
fn pause_freezes_position_and_resume_continues() {
    let (mut session, _) = two_clip_session();
    let t0 = Instant::now();
    session.play(t0);
    session.pause(t0 + secs(1.0));
    assert_eq!(session.state(), PlaybackState::Paused);
    assert!(session.tick(t0 + secs(3.0)).is_none());
    assert_eq!(session.current_time(), 1.0);

    let t1 = t0 + secs(10.0);
    session.play(t1);
    session.tick(t1 + secs(0.5)).unwrap();
    assert_eq!(session.current_time(), 1.5);
}

#[test]
fn reaching_the_end_stops_and_rewinds() {
    let (mut session, _) = two_clip_session();
    let t0 = Instant::now();
    session.play(t0);
    let frame = session.tick(t0 + secs(4.5)).unwrap();
    assert_eq!(session.state(), PlaybackState::Stopped);
    assert_eq!(session.current_time(), 0.0);
    assert_eq!(frame.pixel(0, 0), Some(Color::RED));
}

#[test]
fn render_issued_before_seek_is_discarded() {
    let (mut session, _) = two_clip_session();
    let ticket = session.request_render();
    let late = session.render_ticket(ticket);

    let shown = session.seek(3.0);
    assert!(!session.submit_render(ticket, late));
    assert_eq!(session.current_frame(), Some(&shown));
    assert_eq!(shown.pixel(1, 1), Some(Color::BLUE));

    let fresh = session.request_render();
    let frame = session.render_ticket(fresh);
    assert!(session.submit_render(fresh, frame));
}

#[test]
fn older_frame_does_not_replace_newer_during_playback() {
    let (mut session, _) = two_clip_session();
    let t0 = Instant::now();
    session.play(t0);
    session.tick(t0 + secs(0.25));
    let early = session.request_render();
    session.tick(t0 + secs(1.0));

    let frame = session.render_ticket(early);
    assert!(!session.submit_render(early, frame));
}

#[test]
fn edit_drops_cached_frames_and_updates_clock() {
    let (mut session, video) = two_clip_session();
    assert_eq!(session.seek(3.0).pixel(0, 0), Some(Color::BLUE));
    assert_eq!(session.cache_stats().entries, 1);

    let ticket = session.request_render();
    session.edit(|tl| {
        tl.add_clip(video, Clip::new(MediaRef::new("#00ff00"), 4.0, 6.0))
            .map(|_| ())
    })
    .unwrap();
    assert_eq!(session.cache_stats().entries, 0);
    assert_eq!(session.clock().duration(), 6.0);

    let frame = session.render_ticket(ticket);
    assert!(!session.submit_render(ticket, frame));
    assert_eq!(session.seek(5.0).pixel(0, 0), Some(Color::GREEN));
}

#[test]
fn shortening_timeline_pulls_playhead_back() {
    let (mut session, video) = two_clip_session();
    session.seek(3.5);
    let second = session.timeline().tracks()[0].clips[1].id;
    session.edit(|tl| tl.remove_clip(video, second).map(|_| ())).unwrap();
    assert_eq!(session.current_time(), 2.0);
}

#[test]
fn saved_session_reloads_with_same_timeline() {
    let (session, _) = two_clip_session();
    let bytes = session.save().unwrap();
    let mut reloaded = EditSession::load(
        &bytes,
        SessionConfig::default(),
        Box::new(SolidMedia::default()),
        Box::new(BoxOverlayRenderer),
    )
    .unwrap();
    assert_eq!(reloaded.timeline(), session.timeline());
    assert_eq!(reloaded.clock().duration(), 4.0);
    assert_eq!(reloaded.seek(1.0).pixel(0, 0), Some(Color::RED));
}

#[tokio::test]
async fn preload_warms_cache_ahead_of_playhead() {
    let (mut session, _) = two_clip_session();
    let rendered = session.preload(0.0, 1.0, 0.25).await;
    assert_eq!(rendered, 5);
    assert_eq!(session.cache_stats().entries, 5);

    session.seek(0.5);
    assert_eq!(session.cache_stats().hits, 1);
}

#[test]
fn bare_clock_respects_seek_bounds() {
    let mut clock = PlaybackClock::new(4.0);
    assert_eq!(clock.seek(-1.0), 0.0);
    assert_eq!(clock.seek(9.0), 4.0);
    let t0 = Instant::now();
    clock.play(t0);
    assert_eq!(clock.current_time(), 0.0);
    assert_eq!(clock.tick(t0 + secs(1.0)), Tick::Advanced(1.0));
}
