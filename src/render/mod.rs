pub mod scene;

pub use scene::{SceneModel, TileSprite, VehicleSprite};

use crate::core::Color;

/// Text readouts shown above the road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readout {
    Timestep,
    Speed,
    JamBanner,
}

/// Opaque reference to something the surface draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Tile(usize),
    Vehicle(usize),
    /// One spoke of one wheel; `wheel` is 0 for the rear wheel, 1 for the front
    Spoke { vehicle: usize, wheel: usize, spoke: usize },
    Readout(Readout),
}

/// Drawing operations the playback engine needs from a renderer.
///
/// Implementations decide what a handle looks like; the engine only moves,
/// shows, tints and labels them. Calls for handles the surface does not know
/// are ignored.
pub trait RenderSurface {
    fn set_position(&mut self, handle: Handle, x: f32, y: f32);

    fn set_visible(&mut self, handle: Handle, visible: bool);

    fn set_tint(&mut self, handle: Handle, color: Color);

    fn set_text(&mut self, handle: Handle, text: &str);

    /// Absolute rotation in radians
    fn set_rotation(&mut self, handle: Handle, radians: f32);
}
