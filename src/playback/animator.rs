use super::context::PlaybackContext;
use super::PlaybackConfig;
use crate::render::{Handle, RenderSurface};
use std::f32::consts::TAU;

/// Background tiles laid end to end; a tile that leaves on the left is moved
/// behind the rightmost one.
#[derive(Debug, Clone)]
pub struct TileRing {
    xs: Vec<f32>,
    width: f32,
    y: f32,
}

impl TileRing {
    pub fn new(config: &PlaybackConfig) -> Self {
        let width = config.viewport_width;
        Self {
            xs: (0..config.background_tiles).map(|i| i as f32 * width).collect(),
            width,
            y: config.viewport_height / 2.0,
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.xs
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    fn rightmost(&self) -> f32 {
        self.xs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Move every tile left by `amount`, then wrap tiles whose right edge passed x = 0.
    /// Returns how many tiles were relocated.
    pub fn scroll(&mut self, amount: f32) -> usize {
        for x in &mut self.xs {
            *x -= amount;
        }

        // All tiles must have moved before the rightmost one is measured,
        // otherwise each wrap leaves a gap of `amount`.
        let mut relocated = 0;
        for i in 0..self.xs.len() {
            if self.xs[i] <= -self.width {
                self.xs[i] = self.rightmost() + self.width;
                relocated += 1;
            }
        }
        relocated
    }

    pub fn sync<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        for (i, x) in self.xs.iter().enumerate() {
            surface.set_position(Handle::Tile(i), *x, self.y);
        }
    }
}

/// Per-frame motion driven by the last published state
#[derive(Debug, Default)]
pub struct FrameAnimator {
    frames: u64,
    relocations: u64,
}

impl FrameAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn relocations(&self) -> u64 {
        self.relocations
    }

    /// Advance one render frame.
    ///
    /// The background moves by `scroll_speed` per call whatever `delta_ms` is,
    /// so its pace follows the display refresh rate. Wheels are scaled by
    /// `delta_ms`. Nothing moves until a state has been published.
    pub fn frame<S: RenderSurface + ?Sized>(&mut self, ctx: &mut PlaybackContext, surface: &mut S, delta_ms: f32) {
        let Some(state) = ctx.published() else {
            return;
        };
        self.frames += 1;

        if state.is_moving() {
            self.relocations += ctx.tiles.scroll(state.scroll_speed) as u64;
            ctx.tiles.sync(surface);
        }

        let step = state.rotation_speed * (delta_ms.max(0.0) / 1000.0);
        if step == 0.0 {
            return;
        }

        for vehicle in ctx.pool.visible_mut() {
            for (w, wheel) in vehicle.wheels.iter_mut().enumerate() {
                for (s, angle) in wheel.spokes.iter_mut().enumerate() {
                    *angle = (*angle + step).rem_euclid(TAU);
                    surface.set_rotation(Handle::Spoke { vehicle: vehicle.index, wheel: w, spoke: s }, *angle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DerivedAnimationState, TrafficRecord};
    use crate::playback::layout::layout;
    use crate::render::SceneModel;

    fn published(ctx: &mut PlaybackContext, scene: &mut SceneModel, state: DerivedAnimationState) {
        let config = *ctx.config();
        layout(&mut ctx.pool, &state, &config, scene);
        ctx.publish(TrafficRecord::new(0, 50.0, state.active_car_count as u32, 0, state.jam_active), state);
    }

    fn moving(scroll: f32, rotation: f32, cars: usize) -> DerivedAnimationState {
        DerivedAnimationState {
            scroll_speed: scroll,
            rotation_speed: rotation,
            active_car_count: cars,
            car_spacing: 40.0,
            jam_active: false,
        }
    }

    fn setup() -> (PlaybackContext, SceneModel) {
        let config = PlaybackConfig::default();
        let scene = SceneModel::new(config.background_tiles, config.capacity, config.spokes_per_wheel);
        (PlaybackContext::new(config), scene)
    }

    #[test]
    fn test_nothing_moves_before_first_publish() {
        let (mut ctx, mut scene) = setup();
        let before = ctx.tiles.positions().to_vec();

        let mut animator = FrameAnimator::new();
        animator.frame(&mut ctx, &mut scene, 16.0);

        assert_eq!(ctx.tiles.positions(), before.as_slice());
        assert_eq!(animator.frames(), 0);
    }

    #[test]
    fn test_scroll_ignores_delta() {
        let (mut ctx, mut scene) = setup();
        published(&mut ctx, &mut scene, moving(2.0, 1.0, 1));

        let mut animator = FrameAnimator::new();
        animator.frame(&mut ctx, &mut scene, 5.0);
        animator.frame(&mut ctx, &mut scene, 100.0);

        assert_eq!(ctx.tiles.positions()[0], -4.0);
        assert_eq!(scene.tiles[0].x, -4.0);
        assert_eq!(scene.tiles[0].y, ctx.config().viewport_height / 2.0);
    }

    #[test]
    fn test_wheels_scale_with_delta() {
        let (mut ctx, mut scene) = setup();
        published(&mut ctx, &mut scene, moving(1.0, 2.0, 2));

        let mut animator = FrameAnimator::new();
        animator.frame(&mut ctx, &mut scene, 250.0);

        let angle = ctx.pool.slots()[0].wheels[1].spokes[0];
        assert!((angle - 0.5).abs() < 1e-6);
        assert!((scene.vehicles[1].spokes[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_hidden_vehicles_do_not_spin() {
        let (mut ctx, mut scene) = setup();
        published(&mut ctx, &mut scene, moving(1.0, 2.0, 1));

        let mut animator = FrameAnimator::new();
        animator.frame(&mut ctx, &mut scene, 500.0);

        assert_eq!(ctx.pool.slots()[1].wheels[0].spokes[0], 0.0);
    }

    #[test]
    fn test_jam_freezes_background_but_wheels_turn() {
        let (mut ctx, mut scene) = setup();
        let jam = DerivedAnimationState {
            jam_active: true,
            ..moving(0.0, 3.6, 3)
        };
        published(&mut ctx, &mut scene, jam);
        let before = ctx.tiles.positions().to_vec();

        let mut animator = FrameAnimator::new();
        animator.frame(&mut ctx, &mut scene, 100.0);

        assert_eq!(ctx.tiles.positions(), before.as_slice());
        assert!(ctx.pool.slots()[0].wheels[0].spokes[0] > 0.0);
    }

    #[test]
    fn test_ring_relocates_behind_rightmost() {
        let config = PlaybackConfig {
            viewport_width: 100.0,
            background_tiles: 3,
            ..PlaybackConfig::default()
        };
        let mut ring = TileRing::new(&config);

        assert_eq!(ring.scroll(60.0), 0);
        assert_eq!(ring.positions(), &[-60.0, 40.0, 140.0]);

        assert_eq!(ring.scroll(40.0), 1);
        assert_eq!(ring.positions(), &[200.0, 0.0, 100.0]);
    }

    #[test]
    fn test_ring_stays_unbroken() {
        let config = PlaybackConfig::default();
        let mut ring = TileRing::new(&config);
        let width = ring.width();

        for _ in 0..1000 {
            ring.scroll(7.3);
            let mut xs = ring.positions().to_vec();
            xs.sort_by(|a, b| a.total_cmp(b));

            assert!(xs[0] > -width && xs[0] <= 0.01);
            for pair in xs.windows(2) {
                assert!((pair[1] - pair[0] - width).abs() < 0.05);
            }
        }
    }
}
