use super::animator::{FrameAnimator, TileRing};
use super::layout::VehiclePool;
use super::scheduler::PlaybackScheduler;
use super::store::RecordStore;
use super::{PlaybackConfig, PlaybackState};
use crate::core::{DerivedAnimationState, SegmentError, TrafficRecord};
use crate::render::{Handle, Readout, RenderSurface};
use std::time::Instant;
use tracing::info;

/// Everything that belongs to the segment currently on screen
#[derive(Debug)]
pub struct PlaybackContext {
    config: PlaybackConfig,
    pub store: RecordStore,
    pub pool: VehiclePool,
    pub tiles: TileRing,
    published: Option<DerivedAnimationState>,
    current: Option<TrafficRecord>,
}

impl PlaybackContext {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            store: RecordStore::new(),
            pool: VehiclePool::new(&config),
            tiles: TileRing::new(&config),
            published: None,
            current: None,
            config,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Latest state handed to the frame animator
    pub fn published(&self) -> Option<DerivedAnimationState> {
        self.published
    }

    /// Record the published state was derived from
    pub fn current_record(&self) -> Option<&TrafficRecord> {
        self.current.as_ref()
    }

    pub fn publish(&mut self, record: TrafficRecord, state: DerivedAnimationState) {
        self.current = Some(record);
        self.published = Some(state);
    }

    /// Push the full initial scene: tiles in place, every vehicle hidden, readouts blank
    pub fn sync<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        self.tiles.sync(surface);
        self.pool.sync(surface);
        surface.set_text(Handle::Readout(Readout::Timestep), "Timestep: -");
        surface.set_text(Handle::Readout(Readout::Speed), "Speed: - km/h");
        surface.set_text(Handle::Readout(Readout::JamBanner), "");
    }
}

/// Owns the playback context and both timing domains
#[derive(Debug)]
pub struct PlaybackController {
    ctx: PlaybackContext,
    scheduler: PlaybackScheduler,
    animator: FrameAnimator,
    segment: Option<i64>,
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            ctx: PlaybackContext::new(config),
            scheduler: PlaybackScheduler::new(),
            animator: FrameAnimator::new(),
            segment: None,
        }
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.ctx
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn animator(&self) -> &FrameAnimator {
        &self.animator
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Segment currently playing
    pub fn segment(&self) -> Option<i64> {
        self.segment
    }

    /// Cancel the pending tick and discard every per-segment value.
    ///
    /// The vehicle pool and tile ring are rebuilt and the surface is brought
    /// back to its empty scene.
    pub fn reset<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.scheduler.stop();
        if let Some(segment) = self.segment.take() {
            info!(segment, "segment unloaded");
        }

        let config = *self.ctx.config();
        self.ctx = PlaybackContext::new(config);
        self.animator = FrameAnimator::new();
        self.ctx.sync(surface);
    }

    /// Replace whatever is playing with `records` of `segment`.
    ///
    /// The old segment is torn down before the new records are checked, so a
    /// failed load leaves the controller idle rather than replaying stale data.
    pub fn load_segment<S: RenderSurface + ?Sized>(
        &mut self,
        segment: i64,
        records: Vec<TrafficRecord>,
        surface: &mut S,
        now: Instant,
    ) -> Result<usize, SegmentError> {
        self.reset(surface);

        self.ctx.store.load(records)?;
        self.scheduler.start(&self.ctx, now)?;
        self.segment = Some(segment);

        let count = self.ctx.store.len();
        info!(segment, records = count, "segment loaded");
        Ok(count)
    }

    /// Discrete domain: fire the record tick if it is due
    pub fn poll<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, now: Instant) -> Option<TrafficRecord> {
        self.scheduler.poll(&mut self.ctx, surface, now)
    }

    /// Continuous domain: one render frame of `delta_ms` milliseconds
    pub fn frame<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, delta_ms: f32) {
        self.animator.frame(&mut self.ctx, surface, delta_ms);
    }
}
