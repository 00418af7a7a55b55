use super::context::PlaybackContext;
use super::derive::derive_state;
use super::layout::layout;
use super::PlaybackState;
use crate::core::{SegmentError, TrafficRecord};
use crate::render::{Handle, Readout, RenderSurface};
use std::time::Instant;
use tracing::{debug, info};

/// Handle to the one tick that is waiting to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTick {
    pub due: Instant,
    /// Run that scheduled this tick; bumped on every start
    pub generation: u64,
}

/// Steps through records on a fixed interval.
///
/// The host polls with the current instant; when the pending tick is due the
/// next record is applied and the following tick scheduled `time_unit` after
/// the poll that fired it. A late poll fires a single tick, never a backlog.
#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    pending: Option<PendingTick>,
    generation: u64,
    ticks: u64,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            pending: None,
            generation: 0,
            ticks: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn pending(&self) -> Option<PendingTick> {
        self.pending
    }

    pub fn pending_ticks(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    /// Ticks fired since the last start
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Begin playing `ctx` from its first record after the boot delay.
    ///
    /// Any tick still pending from an earlier run is cancelled first.
    pub fn start(&mut self, ctx: &PlaybackContext, now: Instant) -> Result<(), SegmentError> {
        self.stop();

        if ctx.store.is_empty() {
            return Err(SegmentError::EmptySegment);
        }

        self.generation += 1;
        self.ticks = 0;
        self.pending = Some(PendingTick {
            due: now + ctx.config().boot_delay,
            generation: self.generation,
        });
        self.state = PlaybackState::Playing;

        info!(generation = self.generation, records = ctx.store.len(), "playback started");
        Ok(())
    }

    /// Cancel the pending tick. Nothing fires until the next start.
    pub fn stop(&mut self) {
        if self.pending.take().is_some() {
            debug!(generation = self.generation, "cancelled pending tick");
        }
        if self.state == PlaybackState::Playing {
            info!(generation = self.generation, ticks = self.ticks, "playback stopped");
        }
        self.state = PlaybackState::Idle;
    }

    /// Fire the pending tick if it is due. Returns the record applied.
    pub fn poll<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut PlaybackContext,
        surface: &mut S,
        now: Instant,
    ) -> Option<TrafficRecord> {
        if self.state != PlaybackState::Playing {
            return None;
        }

        let tick = self.pending?;
        if now < tick.due {
            return None;
        }
        self.pending = None;

        let record = Self::apply_next(ctx, surface)?;
        self.ticks += 1;

        self.pending = Some(PendingTick {
            due: now + ctx.config().time_unit,
            generation: tick.generation,
        });

        Some(record)
    }

    /// Pull the next record and push everything derived from it
    fn apply_next<S: RenderSurface + ?Sized>(ctx: &mut PlaybackContext, surface: &mut S) -> Option<TrafficRecord> {
        let record = ctx.store.advance()?;
        let config = *ctx.config();
        let state = derive_state(&record, &config);

        layout(&mut ctx.pool, &state, &config, surface);
        ctx.publish(record, state);

        surface.set_text(Handle::Readout(Readout::Timestep), &format!("Timestep: {}", record.time_step));
        surface.set_text(
            Handle::Readout(Readout::Speed),
            &format!("Speed: {:.1} km/h", record.average_speed_kmph),
        );
        surface.set_text(
            Handle::Readout(Readout::JamBanner),
            if record.phantom_jam_flag { JAM_BANNER } else { "" },
        );

        debug!(
            time_step = record.time_step,
            cars = state.active_car_count,
            scroll = state.scroll_speed,
            jam = state.jam_active,
            "applied record"
        );
        Some(record)
    }
}

pub const JAM_BANNER: &str = "!! PHANTOM JAM !!";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackConfig;
    use crate::render::SceneModel;
    use std::time::Duration;

    fn records(n: i64) -> Vec<TrafficRecord> {
        (0..n).map(|i| TrafficRecord::new(i, 30.0 + i as f64, 4, 0, i == 2)).collect()
    }

    fn setup(n: i64) -> (PlaybackContext, SceneModel) {
        let config = PlaybackConfig::default();
        let scene = SceneModel::new(config.background_tiles, config.capacity, config.spokes_per_wheel);
        let mut ctx = PlaybackContext::new(config);
        ctx.store.load(records(n)).unwrap();
        (ctx, scene)
    }

    #[test]
    fn test_first_tick_waits_for_boot_delay() {
        let (mut ctx, mut scene) = setup(3);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();

        scheduler.start(&ctx, t0).unwrap();
        assert!(scheduler.poll(&mut ctx, &mut scene, t0).is_none());
        assert!(ctx.published().is_none());

        let first = scheduler.poll(&mut ctx, &mut scene, t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(first.time_step, 0);
        assert!(ctx.published().is_some());
        assert_eq!(scene.readout(Readout::Timestep), "Timestep: 0");
        assert_eq!(scene.readout(Readout::Speed), "Speed: 30.0 km/h");
    }

    #[test]
    fn test_ticks_follow_time_unit() {
        let (mut ctx, mut scene) = setup(3);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();
        let boot = t0 + Duration::from_millis(100);

        scheduler.start(&ctx, t0).unwrap();
        scheduler.poll(&mut ctx, &mut scene, boot).unwrap();

        assert!(scheduler.poll(&mut ctx, &mut scene, boot + Duration::from_millis(1499)).is_none());
        let second = scheduler.poll(&mut ctx, &mut scene, boot + Duration::from_millis(1500)).unwrap();
        assert_eq!(second.time_step, 1);
        assert_eq!(scheduler.pending_ticks(), 1);
    }

    #[test]
    fn test_late_poll_fires_once() {
        let (mut ctx, mut scene) = setup(5);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();

        scheduler.start(&ctx, t0).unwrap();
        let late = t0 + Duration::from_secs(60);
        assert!(scheduler.poll(&mut ctx, &mut scene, late).is_some());
        assert!(scheduler.poll(&mut ctx, &mut scene, late).is_none());
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn test_playback_is_periodic() {
        let n = 4;
        let (mut ctx, mut scene) = setup(n);
        let mut scheduler = PlaybackScheduler::new();
        let mut now = Instant::now();

        scheduler.start(&ctx, now).unwrap();
        let mut applied = Vec::new();
        for _ in 0..(3 * n) {
            now += Duration::from_secs(2);
            applied.push(scheduler.poll(&mut ctx, &mut scene, now).unwrap().time_step);
        }

        assert_eq!(&applied[..4], &[0, 1, 2, 3]);
        assert_eq!(&applied[..4], &applied[4..8]);
        assert_eq!(&applied[4..8], &applied[8..12]);
        assert_eq!(ctx.store.cursor(), 0);
    }

    #[test]
    fn test_jam_banner_follows_record() {
        let (mut ctx, mut scene) = setup(4);
        let mut scheduler = PlaybackScheduler::new();
        let mut now = Instant::now();
        scheduler.start(&ctx, now).unwrap();

        let mut banners = Vec::new();
        for _ in 0..4 {
            now += Duration::from_secs(2);
            scheduler.poll(&mut ctx, &mut scene, now).unwrap();
            banners.push(scene.readout(Readout::JamBanner).to_string());
        }

        assert_eq!(banners, vec!["", "", JAM_BANNER, ""]);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let (mut ctx, mut scene) = setup(3);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();

        scheduler.start(&ctx, t0).unwrap();
        scheduler.stop();

        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.pending_ticks(), 0);
        assert!(scheduler.poll(&mut ctx, &mut scene, t0 + Duration::from_secs(10)).is_none());
        assert!(ctx.published().is_none());
    }

    #[test]
    fn test_empty_store_never_starts() {
        let config = PlaybackConfig::default();
        let ctx = PlaybackContext::new(config);
        let mut scheduler = PlaybackScheduler::new();

        assert!(matches!(scheduler.start(&ctx, Instant::now()), Err(SegmentError::EmptySegment)));
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.pending_ticks(), 0);
    }

    #[test]
    fn test_restart_leaves_single_pending_tick() {
        let (ctx, _) = setup(3);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();

        scheduler.start(&ctx, t0).unwrap();
        let first = scheduler.pending().unwrap();
        scheduler.start(&ctx, t0 + Duration::from_millis(50)).unwrap();
        let second = scheduler.pending().unwrap();

        assert_eq!(scheduler.pending_ticks(), 1);
        assert!(second.generation > first.generation);
        assert!(second.due > first.due);
    }

    #[test]
    fn test_rescheduled_tick_keeps_run_generation() {
        let (mut ctx, mut scene) = setup(3);
        let mut scheduler = PlaybackScheduler::new();
        let t0 = Instant::now();

        scheduler.start(&ctx, t0).unwrap();
        let first = scheduler.pending().unwrap();
        let fired = t0 + Duration::from_millis(250);
        scheduler.poll(&mut ctx, &mut scene, fired).unwrap();

        let next = scheduler.pending().unwrap();
        assert_eq!(next.generation, first.generation);
        assert_eq!(next.due, fired + Duration::from_millis(1500));
    }
}
