pub mod animator;
pub mod context;
pub mod derive;
pub mod layout;
pub mod scheduler;
pub mod store;

pub use context::PlaybackController;

use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Geometry and timing shared by every playback component.
///
/// Built once from `AppConfig` at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// x of the first vehicle
    pub left_edge: f32,
    pub road_length: f32,
    pub lane_y: f32,
    pub background_tiles: usize,
    pub capacity: usize,
    /// Interval between record ticks
    pub time_unit: Duration,
    /// Delay before the first record of a segment is applied
    pub boot_delay: Duration,
    pub base_scroll_speed: f32,
    pub spokes_per_wheel: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1450.0,
            viewport_height: 750.0,
            left_edge: 40.0,
            road_length: 1370.0,
            lane_y: 625.0,
            background_tiles: 6,
            capacity: 30,
            time_unit: Duration::from_millis(1500),
            boot_delay: Duration::from_millis(100),
            base_scroll_speed: 2.0,
            spokes_per_wheel: 10,
        }
    }
}
