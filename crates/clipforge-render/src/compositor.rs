//! CPU frame compositor.
//!
//! `render_at` is the only entry point the preview loop and the export
//! pipeline need: cache lookup, clip layers bottom track first (with inbound
//! transitions), overlay objects on top, then cache insert.

use clipforge_core::{defaults, Color, FrameBuffer, SharedFrameBuffer};
use clipforge_timeline::{Clip, OverlayKind, Timeline};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::cache::{CacheConfig, CacheStats, FrameCache, Quality};
use crate::media::{MediaSource, OverlayDrawable, OverlayRenderer};
use crate::observer::{RenderGap, RenderObserver, TracingObserver};
use crate::transition::{eased_progress, TransitionRegistry};

/// Slack when deciding whether the preceding clip butts against a transition.
const ADJACENCY_EPSILON: f64 = 1e-6;

/// Configuration for the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub quality: Quality,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
            background: Color::BLACK,
            quality: Quality::Standard,
        }
    }
}

struct Materialized {
    kind: OverlayKind,
    drawable: Box<dyn OverlayDrawable>,
}

/// Borrowed view of everything needed to build one frame.
struct Scene<'a> {
    config: &'a CompositorConfig,
    media: &'a dyn MediaSource,
    drawables: &'a HashMap<Uuid, Materialized>,
    transitions: &'a TransitionRegistry,
    observer: &'a dyn RenderObserver,
}

impl Scene<'_> {
    fn compose(&self, timeline: &Timeline, t: f64) -> FrameBuffer {
        let (w, h) = (self.config.width, self.config.height);
        let mut out = FrameBuffer::filled(w, h, self.config.background);

        for active in timeline.active_clips(t) {
            let clip = active.clip;
            let Some(sample) = self.media.sample(&clip.source, clip.local_time(t)) else {
                self.observer.on_gap(&RenderGap::MissingSample {
                    track: active.track.id,
                    clip: clip.id,
                    time: t,
                });
                continue;
            };

            match clip.transition.filter(|_| clip.in_transition_at(t)) {
                Some(transition) => {
                    let from = self.outgoing_sample(timeline, clip, t, &out);
                    let progress = eased_progress(&transition, t, clip.start);
                    trace!(clip = %clip.id, kind = %transition.kind, progress, "transition");
                    self.transitions
                        .composite(&from, &sample, &transition, progress, &mut out);
                }
                None => out.draw(&sample, 1.0),
            }
        }

        for object in timeline.visible_objects() {
            if let Some(m) = self.drawables.get(&object.id) {
                m.drawable.draw(&object.resolve(t), &mut out);
            }
        }
        out
    }

    /// Last sample of the clip ending where `clip` begins, or the layers
    /// composited so far when there is none.
    fn outgoing_sample(
        &self,
        timeline: &Timeline,
        clip: &Clip,
        t: f64,
        beneath: &FrameBuffer,
    ) -> SharedFrameBuffer {
        let Some(prev) = timeline
            .preceding_clip(clip)
            .filter(|prev| prev.end + ADJACENCY_EPSILON >= clip.start)
        else {
            return Arc::new(beneath.clone());
        };
        match self.media.sample(&prev.source, prev.duration()) {
            Some(sample) => sample,
            None => {
                self.observer.on_gap(&RenderGap::MissingTransitionSource {
                    track: clip.track_id,
                    clip: clip.id,
                    time: t,
                });
                Arc::new(beneath.clone())
            }
        }
    }
}

/// Composites timeline frames and caches the results.
pub struct FrameCompositor {
    config: CompositorConfig,
    cache: FrameCache,
    media: Box<dyn MediaSource>,
    overlays: Box<dyn OverlayRenderer>,
    drawables: HashMap<Uuid, Materialized>,
    transitions: TransitionRegistry,
    observer: Box<dyn RenderObserver>,
}

impl FrameCompositor {
    pub fn new(
        config: CompositorConfig,
        cache: CacheConfig,
        media: Box<dyn MediaSource>,
        overlays: Box<dyn OverlayRenderer>,
    ) -> Self {
        Self {
            config,
            cache: FrameCache::new(cache),
            media,
            overlays,
            drawables: HashMap::new(),
            transitions: TransitionRegistry::new(),
            observer: Box::new(TracingObserver),
        }
    }

    /// Builder: report render gaps somewhere other than the log.
    pub fn with_observer(mut self, observer: Box<dyn RenderObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Change output size, background or quality. Cached frames are dropped.
    pub fn reconfigure(&mut self, config: CompositorConfig) {
        if config != self.config {
            debug!(width = config.width, height = config.height, "compositor reconfigured");
            self.config = config;
            self.cache.clear();
        }
    }

    pub fn transitions_mut(&mut self) -> &mut TransitionRegistry {
        &mut self.transitions
    }

    /// Frame at timeline time `t`, from the cache when possible.
    ///
    /// A non-finite `t` yields an uncached background frame.
    pub fn render_at(&mut self, timeline: &Timeline, t: f64) -> SharedFrameBuffer {
        if !t.is_finite() {
            warn!(t, "non-finite render time");
            return Arc::new(FrameBuffer::filled(
                self.config.width,
                self.config.height,
                self.config.background,
            ));
        }
        let quality = self.config.quality;
        if let Some(frame) = self.cache.get(t, quality) {
            return frame;
        }

        self.sync_drawables(timeline);
        let frame = Arc::new(self.scene().compose(timeline, t));
        self.cache.set(t, frame.clone(), quality);
        frame
    }

    /// Render and cache frames every `step` seconds across `[start, end]`.
    pub async fn preload(&mut self, timeline: &Timeline, start: f64, end: f64, step: f64) -> usize {
        self.sync_drawables(timeline);
        let scene = Scene {
            config: &self.config,
            media: self.media.as_ref(),
            drawables: &self.drawables,
            transitions: &self.transitions,
            observer: self.observer.as_ref(),
        };
        let scene = &scene;
        self.cache
            .preload(start, end, step, self.config.quality, |t| async move {
                Arc::new(scene.compose(timeline, t))
            })
            .await
    }

    /// Drop cached frames after the timeline changed.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, t: f64) -> bool {
        self.cache.has(t, self.config.quality)
    }

    /// Whether `object_id` currently has a materialised drawable.
    pub fn has_drawable(&self, object_id: Uuid) -> bool {
        self.drawables.contains_key(&object_id)
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Give every object in the timeline a drawable and drop stale ones.
    pub fn sync_drawables(&mut self, timeline: &Timeline) {
        let objects = timeline.objects();
        self.drawables.retain(|id, _| objects.contains(*id));
        for object in objects.iter() {
            let fresh = self
                .drawables
                .get(&object.id)
                .is_some_and(|m| m.kind == object.kind);
            if !fresh {
                debug!(object = %object.id, "materializing overlay object");
                self.drawables.insert(
                    object.id,
                    Materialized {
                        kind: object.kind.clone(),
                        drawable: self.overlays.materialize(object),
                    },
                );
            }
        }
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            config: &self.config,
            media: self.media.as_ref(),
            drawables: &self.drawables,
            transitions: &self.transitions,
            observer: self.observer.as_ref(),
        }
    }
}
