//! An editing session: one project, one clock, one compositor and cache.
//!
//! Sessions never share a cache. All timeline mutation goes through
//! [`EditSession::edit`] so cached frames and the clock duration stay
//! coherent with the model.

use clipforge_core::{Result, SharedFrameBuffer};
use clipforge_render::{
    BackgroundWorker, CacheStats, CompositorConfig, FrameCompositor, MediaSource, OverlayRenderer,
};
use clipforge_timeline::{AudioEvent, Project, ProjectFile, ProjectSettings, Timeline};
use std::time::Instant;
use tracing::{debug, info};

use crate::clock::{PlaybackClock, PlaybackState, Tick};
use crate::config::SessionConfig;

/// Identifies a render requested for some time under some seek generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTicket {
    pub generation: u64,
    pub time: f64,
}

pub struct EditSession {
    project: Project,
    clock: PlaybackClock,
    compositor: FrameCompositor,
    worker: BackgroundWorker,
    /// Bumped by every seek and edit; older tickets are stale.
    generation: u64,
    presented: Option<(f64, SharedFrameBuffer)>,
}

fn compositor_config(base: &CompositorConfig, settings: &ProjectSettings) -> CompositorConfig {
    CompositorConfig {
        width: settings.width,
        height: settings.height,
        background: settings.background_color,
        quality: base.quality,
    }
}

impl EditSession {
    /// Open `project`. Output size and background come from the project's
    /// settings; everything else from `config`.
    pub fn new(
        project: Project,
        config: SessionConfig,
        media: Box<dyn MediaSource>,
        overlays: Box<dyn OverlayRenderer>,
    ) -> Self {
        let compositor = FrameCompositor::new(
            compositor_config(&config.compositor, &project.settings),
            config.cache,
            media,
            overlays,
        );
        let clock = PlaybackClock::new(project.duration());
        info!(
            project = %project.id,
            name = %project.name,
            duration = project.duration(),
            "session opened"
        );
        Self {
            project,
            clock,
            compositor,
            worker: BackgroundWorker::new(config.worker),
            generation: 0,
            presented: None,
        }
    }

    /// Open a session from a persisted project file.
    pub fn load(
        data: &[u8],
        config: SessionConfig,
        media: Box<dyn MediaSource>,
        overlays: Box<dyn OverlayRenderer>,
    ) -> Result<Self> {
        let file = ProjectFile::from_json(data)?;
        Ok(Self::new(file.project, config, media, overlays))
    }

    /// Serialize the project. The frame cache is never persisted.
    pub fn save(&self) -> Result<Vec<u8>> {
        ProjectFile::new(self.project.clone()).to_json()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn timeline(&self) -> &Timeline {
        &self.project.timeline
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn worker(&self) -> &BackgroundWorker {
        &self.worker
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.compositor.cache_stats()
    }

    /// Last frame handed to the display.
    pub fn current_frame(&self) -> Option<&SharedFrameBuffer> {
        self.presented.as_ref().map(|(_, frame)| frame)
    }

    // ── Editing ─────────────────────────────────────────────────

    /// Mutate the timeline. Cached frames are dropped, the clock duration is
    /// re-synced and in-flight renders become stale.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Timeline) -> R) -> R {
        let result = f(&mut self.project.timeline);
        self.compositor.invalidate();
        self.clock.set_duration(self.project.timeline.duration());
        self.generation += 1;
        debug!(
            generation = self.generation,
            duration = self.clock.duration(),
            "timeline edited"
        );
        result
    }

    /// Change output settings. The compositor follows size and background.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut ProjectSettings)) {
        f(&mut self.project.settings);
        let config = compositor_config(self.compositor.config(), &self.project.settings);
        self.compositor.reconfigure(config);
        self.generation += 1;
    }

    // ── Transport ───────────────────────────────────────────────

    pub fn play(&mut self, now: Instant) {
        self.clock.play(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.clock.pause(now);
    }

    /// Stop, rewind and show the first frame.
    pub fn stop(&mut self) -> SharedFrameBuffer {
        self.clock.stop();
        self.generation += 1;
        self.present_now()
    }

    /// Jump to `time`, pause, and render immediately.
    pub fn seek(&mut self, time: f64) -> SharedFrameBuffer {
        self.clock.seek(time);
        self.generation += 1;
        self.present_now()
    }

    /// Jump to `time` keeping the play state, and render immediately.
    pub fn set_current_time(&mut self, time: f64, now: Instant) -> SharedFrameBuffer {
        self.clock.set_current_time(time, now);
        self.generation += 1;
        self.present_now()
    }

    /// One scheduler tick. Returns the frame to display, if the position moved.
    pub fn tick(&mut self, now: Instant) -> Option<SharedFrameBuffer> {
        match self.clock.tick(now) {
            Tick::Idle => None,
            Tick::Advanced(_) => Some(self.present_now()),
            Tick::Ended => {
                self.generation += 1;
                Some(self.present_now())
            }
        }
    }

    // ── Deferred renders ────────────────────────────────────────

    /// Ticket for rendering the current time outside the tick.
    pub fn request_render(&self) -> RenderTicket {
        RenderTicket {
            generation: self.generation,
            time: self.clock.current_time(),
        }
    }

    /// Render the frame a ticket asks for, without presenting it.
    pub fn render_ticket(&mut self, ticket: RenderTicket) -> SharedFrameBuffer {
        self.compositor.render_at(&self.project.timeline, ticket.time)
    }

    /// Present a frame rendered for `ticket`. Returns `false` and drops the
    /// frame if a seek or edit happened since the ticket was issued, or a
    /// later frame of the same generation is already showing.
    pub fn submit_render(&mut self, ticket: RenderTicket, frame: SharedFrameBuffer) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                time = ticket.time,
                "discarding stale render"
            );
            return false;
        }
        if let Some((shown, _)) = &self.presented {
            if self.clock.is_playing() && *shown > ticket.time {
                return false;
            }
        }
        self.presented = Some((ticket.time, frame));
        true
    }

    /// Warm the cache around a range, e.g. ahead of the playhead.
    pub async fn preload(&mut self, start: f64, end: f64, step: f64) -> usize {
        self.compositor
            .preload(&self.project.timeline, start, end, step)
            .await
    }

    /// Audible events at the current time with their envelope gain.
    pub fn audio_mix(&self) -> Vec<(&AudioEvent, f64)> {
        self.project.timeline.audio_mix_at(self.clock.current_time())
    }

    fn present_now(&mut self) -> SharedFrameBuffer {
        let t = self.clock.current_time();
        let frame = self.compositor.render_at(&self.project.timeline, t);
        self.presented = Some((t, frame.clone()));
        frame
    }
}
