//! Wall-clock driven playback position.
//!
//! Position while playing is `base_time + (now - wall_start)`, anchored at
//! the last `play` (or re-anchoring seek), so repeated ticks never
//! accumulate drift. Callers pass `now` in; the clock never reads time itself.

use std::fmt;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Playing => "playing",
        })
    }
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Not playing; nothing to do.
    Idle,
    /// Playback moved to this time.
    Advanced(f64),
    /// The end was reached; the clock stopped and rewound to 0.
    Ended,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    state: PlaybackState,
    current_time: f64,
    duration: f64,
    base_time: f64,
    wall_start: Option<Instant>,
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            ..Self::default()
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Start or resume. Playing from the end restarts at 0.
    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.anchor(now);
        self.state = PlaybackState::Playing;
        debug!(from = self.current_time, "play");
    }

    /// Freeze at the position reached by `now`.
    pub fn pause(&mut self, now: Instant) {
        if self.is_playing() {
            self.current_time = self
                .position_at(now)
                .max(self.current_time)
                .min(self.duration);
            self.wall_start = None;
        }
        if self.state != PlaybackState::Stopped || self.current_time > 0.0 {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind to 0.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.current_time = 0.0;
        self.base_time = 0.0;
        self.wall_start = None;
    }

    /// Jump to `time` (clamped) and pause.
    pub fn seek(&mut self, time: f64) -> f64 {
        self.current_time = self.clamp(time);
        self.wall_start = None;
        self.state = PlaybackState::Paused;
        self.current_time
    }

    /// Jump to `time` (clamped) without changing state. Playback continues
    /// from the new position.
    pub fn set_current_time(&mut self, time: f64, now: Instant) -> f64 {
        self.current_time = self.clamp(time);
        if self.is_playing() {
            self.anchor(now);
        }
        self.current_time
    }

    /// Update the duration, pulling the position back inside it.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        if self.current_time > self.duration {
            self.current_time = self.duration;
            if self.is_playing() {
                self.base_time = self.duration;
            }
        }
    }

    /// Advance to `now`. Reaching the duration stops the clock.
    pub fn tick(&mut self, now: Instant) -> Tick {
        if !self.is_playing() {
            return Tick::Idle;
        }
        let t = self.position_at(now).max(self.current_time);
        if t >= self.duration {
            debug!(duration = self.duration, "end of timeline");
            self.stop();
            return Tick::Ended;
        }
        self.current_time = t;
        Tick::Advanced(t)
    }

    fn anchor(&mut self, now: Instant) {
        self.base_time = self.current_time;
        self.wall_start = Some(now);
    }

    fn position_at(&self, now: Instant) -> f64 {
        match self.wall_start {
            Some(start) => self.base_time + now.saturating_duration_since(start).as_secs_f64(),
            None => self.current_time,
        }
    }

    fn clamp(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration)
    }
}
