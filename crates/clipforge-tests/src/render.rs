//! Render pipeline integration: compositor gaps and transitions, export,
//! cache bounds and background jobs.

use clipforge_core::{Color, FrameBuffer, FrameRate};
use clipforge_render::{
    export_frames, BackgroundWorker, BoxOverlayRenderer, CacheConfig, CompositorConfig,
    ExportCancel, ExportError, ExportRequest, FrameCompositor, JobError, PixelFilter, RenderGap,
    RenderObserver, TransitionEffect, WorkerConfig,
};
use clipforge_timeline::{
    Clip, MediaRef, Timeline, TrackKind, Transition, TransitionKind, WipeDirection,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::support::SolidMedia;

// ── Fixtures ───────────────────────────────────────────────────

#[derive(Clone, Default)]
struct GapLog(Arc<Mutex<Vec<RenderGap>>>);

impl GapLog {
    fn gaps(&self) -> Vec<RenderGap> {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl RenderObserver for GapLog {
    fn on_gap(&self, gap: &RenderGap) {
        if let Ok(mut gaps) = self.0.lock() {
            gaps.push(gap.clone());
        }
    }
}

fn compositor(media: SolidMedia, cache: CacheConfig) -> (FrameCompositor, GapLog) {
    let gaps = GapLog::default();
    let config = CompositorConfig {
        width: 8,
        height: 8,
        background: Color::GREEN,
        ..CompositorConfig::default()
    };
    let compositor = FrameCompositor::new(
        config,
        cache,
        Box::new(media),
        Box::new(BoxOverlayRenderer),
    )
    .with_observer(Box::new(gaps.clone()));
    (compositor, gaps)
}

/// Red for [0, 2), blue for [2, 4) entering with `transition`.
fn red_then_blue(transition: Option<Transition>) -> Timeline {
    let mut tl = Timeline::new();
    let video = tl.add_track(TrackKind::Video, "Video");
    tl.add_clip(video, Clip::new(MediaRef::new("#ff0000"), 0.0, 2.0))
        .unwrap();
    let mut incoming = Clip::new(MediaRef::new("#0000ff"), 2.0, 4.0);
    incoming.transition = transition;
    tl.add_clip(video, incoming).unwrap();
    tl
}

fn missing(source: &str) -> SolidMedia {
    SolidMedia {
        missing: [source.to_string()].into_iter().collect(),
    }
}

// ── Compositor ─────────────────────────────────────────────────

#[test]
fn missing_sample_leaves_background_and_reports_gap() {
    let tl = red_then_blue(None);
    let (mut comp, gaps) = compositor(missing("#ff0000"), CacheConfig::default());

    let frame = comp.render_at(&tl, 1.0);
    assert_eq!(frame.pixel(4, 4), Some(Color::GREEN));
    let gaps = gaps.gaps();
    assert_eq!(gaps.len(), 1);
    assert!(matches!(gaps[0], RenderGap::MissingSample { time, .. } if time == 1.0));

    // the frame is still produced and cached
    assert!(comp.is_cached(1.0));
}

#[test]
fn wipe_reveals_incoming_clip_from_the_right() {
    let tl = red_then_blue(Some(Transition::wipe(1.0, WipeDirection::Left)));
    let (mut comp, gaps) = compositor(SolidMedia::default(), CacheConfig::default());

    let start = comp.render_at(&tl, 2.0);
    assert_eq!(start.pixel(7, 4), Some(Color::RED));

    let half = comp.render_at(&tl, 2.5);
    assert_eq!(half.pixel(0, 4), Some(Color::RED));
    assert_eq!(half.pixel(3, 4), Some(Color::RED));
    assert_eq!(half.pixel(4, 4), Some(Color::BLUE));
    assert_eq!(half.pixel(7, 4), Some(Color::BLUE));

    let after = comp.render_at(&tl, 3.5);
    assert_eq!(after.pixel(0, 4), Some(Color::BLUE));
    assert!(gaps.gaps().is_empty());
}

#[test]
fn transition_without_outgoing_sample_blends_from_background() {
    let tl = red_then_blue(Some(Transition::fade(1.0)));
    let (mut comp, gaps) = compositor(missing("#ff0000"), CacheConfig::default());

    let px = comp.render_at(&tl, 2.5).pixel(4, 4).unwrap();
    assert_eq!(px.r, 0);
    assert!(px.g > 0 && px.b > 0, "expected green/blue blend, got {px:?}");
    assert!(matches!(
        gaps.gaps().as_slice(),
        [RenderGap::MissingTransitionSource { .. }]
    ));
}

struct Flash;

impl TransitionEffect for Flash {
    fn name(&self) -> &str {
        "Flash"
    }

    fn composite(
        &self,
        _from: &FrameBuffer,
        _to: &FrameBuffer,
        _transition: &Transition,
        _progress: f64,
        target: &mut FrameBuffer,
    ) {
        target.draw(&FrameBuffer::filled(1, 1, Color::WHITE), 1.0);
    }
}

#[test]
fn registered_effect_replaces_builtin() {
    let tl = red_then_blue(Some(Transition::fade(1.0)));
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    comp.transitions_mut()
        .register(TransitionKind::Fade, Box::new(Flash));

    assert_eq!(comp.render_at(&tl, 2.5).pixel(2, 2), Some(Color::WHITE));
    assert_eq!(comp.render_at(&tl, 3.5).pixel(2, 2), Some(Color::BLUE));
}

#[test]
fn cache_keeps_only_most_recent_frames() {
    let tl = red_then_blue(None);
    let cache = CacheConfig {
        max_frames: 3,
        max_memory_mb: 100.0,
    };
    let (mut comp, _) = compositor(SolidMedia::default(), cache);
    for t in [0.0, 0.5, 1.0, 1.5, 2.0] {
        comp.render_at(&tl, t);
    }
    let stats = comp.cache_stats();
    assert_eq!(stats.entries, 3);
    assert!(!comp.is_cached(0.0));
    assert!(!comp.is_cached(0.5));
    assert!(comp.is_cached(2.0));
}

#[tokio::test]
async fn preload_skips_frames_already_cached() {
    let tl = red_then_blue(None);
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    comp.render_at(&tl, 1.0);

    let rendered = comp.preload(&tl, 0.0, 2.0, 0.5).await;
    assert_eq!(rendered, 4);
    assert_eq!(comp.cache_stats().entries, 5);
}

// ── Export ─────────────────────────────────────────────────────

#[test]
fn export_writes_every_frame_in_order() {
    let tl = red_then_blue(None);
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    let request = ExportRequest::new(1.0, 3.0, FrameRate::fps(2));
    let progress = Mutex::new(Vec::new());

    let mut frames: Vec<FrameBuffer> = Vec::new();
    let summary = export_frames(
        &mut comp,
        &tl,
        &request,
        &mut frames,
        |p| {
            if let Ok(mut v) = progress.lock() {
                v.push(p.fraction());
            }
        },
        &ExportCancel::new(),
    )
    .unwrap();

    assert_eq!(summary.frames, 4);
    assert_eq!((summary.width, summary.height), (8, 8));
    let colors: Vec<Option<Color>> = frames.iter().map(|f| f.pixel(0, 0)).collect();
    assert_eq!(
        colors,
        vec![
            Some(Color::RED),
            Some(Color::RED),
            Some(Color::BLUE),
            Some(Color::BLUE)
        ]
    );
    assert_eq!(progress.into_inner().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn cancelled_export_stops_before_next_frame() {
    let tl = red_then_blue(None);
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    let cancel = ExportCancel::new();
    let mut frames: Vec<FrameBuffer> = Vec::new();

    let handle = cancel.clone();
    let err = export_frames(
        &mut comp,
        &tl,
        &ExportRequest::whole(&tl, FrameRate::fps(4)),
        &mut frames,
        |p| {
            if p.frames_done == 3 {
                handle.cancel();
            }
        },
        &cancel,
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::Cancelled { frames: 3 }));
    assert_eq!(frames.len(), 3);
}

#[test]
fn reversed_export_range_is_rejected() {
    let tl = red_then_blue(None);
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    let mut frames: Vec<FrameBuffer> = Vec::new();
    let err = export_frames(
        &mut comp,
        &tl,
        &ExportRequest::new(3.0, 1.0, FrameRate::FPS_30),
        &mut frames,
        |_| {},
        &ExportCancel::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::InvalidRange { .. }));
    assert!(frames.is_empty());
}

// ── Background jobs ────────────────────────────────────────────

#[tokio::test]
async fn slow_job_times_out() {
    let worker = BackgroundWorker::new(WorkerConfig { timeout_ms: 20 });
    let err = worker
        .run("slow", || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Timeout { job: "slow", .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn rendered_frame_can_be_filtered_in_background() {
    let tl = red_then_blue(None);
    let (mut comp, _) = compositor(SolidMedia::default(), CacheConfig::default());
    let frame = comp.render_at(&tl, 0.5);

    let worker = BackgroundWorker::default();
    let gray = worker
        .process_frame(frame.clone(), vec![PixelFilter::Grayscale])
        .await
        .unwrap();
    // 0.299 * 255
    assert_eq!(gray.pixel(3, 3), Some(Color::rgb(76, 76, 76)));
    assert_eq!(frame.pixel(3, 3), Some(Color::RED));

    let thumb = worker.thumbnail(frame, 2, 2).await.unwrap();
    assert_eq!((thumb.width, thumb.height), (2, 2));
}
