use super::{Handle, Readout, RenderSurface};
use crate::core::Color;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSprite {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSprite {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub tint: Color,
    /// Spoke angles per wheel, rear then front
    pub spokes: [Vec<f32>; 2],
}

/// Retained copy of everything the playback engine pushed to the screen.
///
/// The road view paints from it each frame; tests inspect it directly.
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    pub tiles: Vec<TileSprite>,
    pub vehicles: Vec<VehicleSprite>,
    readouts: HashMap<Readout, String>,
}

impl SceneModel {
    pub fn new(tiles: usize, vehicles: usize, spokes_per_wheel: usize) -> Self {
        let mut scene = Self::default();
        scene.rebuild(tiles, vehicles, spokes_per_wheel);
        scene
    }

    /// Drop every sprite and allocate a fresh, hidden set
    pub fn rebuild(&mut self, tiles: usize, vehicles: usize, spokes_per_wheel: usize) {
        self.tiles = vec![TileSprite { x: 0.0, y: 0.0 }; tiles];
        self.vehicles = (0..vehicles)
            .map(|_| VehicleSprite {
                x: 0.0,
                y: 0.0,
                visible: false,
                tint: Color(0),
                spokes: [vec![0.0; spokes_per_wheel], vec![0.0; spokes_per_wheel]],
            })
            .collect();
        self.readouts.clear();
    }

    pub fn readout(&self, readout: Readout) -> &str {
        self.readouts.get(&readout).map(String::as_str).unwrap_or("")
    }

    pub fn visible_vehicles(&self) -> impl Iterator<Item = &VehicleSprite> {
        self.vehicles.iter().filter(|v| v.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_vehicles().count()
    }
}

impl RenderSurface for SceneModel {
    fn set_position(&mut self, handle: Handle, x: f32, y: f32) {
        match handle {
            Handle::Tile(i) => {
                if let Some(tile) = self.tiles.get_mut(i) {
                    tile.x = x;
                    tile.y = y;
                }
            }
            Handle::Vehicle(i) => {
                if let Some(vehicle) = self.vehicles.get_mut(i) {
                    vehicle.x = x;
                    vehicle.y = y;
                }
            }
            _ => {}
        }
    }

    fn set_visible(&mut self, handle: Handle, visible: bool) {
        if let Handle::Vehicle(i) = handle {
            if let Some(vehicle) = self.vehicles.get_mut(i) {
                vehicle.visible = visible;
            }
        }
    }

    fn set_tint(&mut self, handle: Handle, color: Color) {
        if let Handle::Vehicle(i) = handle {
            if let Some(vehicle) = self.vehicles.get_mut(i) {
                vehicle.tint = color;
            }
        }
    }

    fn set_text(&mut self, handle: Handle, text: &str) {
        if let Handle::Readout(readout) = handle {
            self.readouts.insert(readout, text.to_string());
        }
    }

    fn set_rotation(&mut self, handle: Handle, radians: f32) {
        if let Handle::Spoke { vehicle, wheel, spoke } = handle {
            if let Some(angle) = self
                .vehicles
                .get_mut(vehicle)
                .and_then(|v| v.spokes.get_mut(wheel))
                .and_then(|w| w.get_mut(spoke))
            {
                *angle = radians;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_handles_are_ignored() {
        let mut scene = SceneModel::new(2, 1, 3);
        scene.set_position(Handle::Tile(9), 1.0, 1.0);
        scene.set_visible(Handle::Vehicle(4), true);
        scene.set_rotation(Handle::Spoke { vehicle: 0, wheel: 2, spoke: 0 }, 1.0);

        assert_eq!(scene.visible_count(), 0);
        assert_eq!(scene.tiles[1], TileSprite { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_readouts_default_to_empty() {
        let mut scene = SceneModel::new(2, 1, 3);
        assert_eq!(scene.readout(Readout::JamBanner), "");

        scene.set_text(Handle::Readout(Readout::Speed), "Speed: 4.0 km/h");
        assert_eq!(scene.readout(Readout::Speed), "Speed: 4.0 km/h");
    }

    #[test]
    fn test_rebuild_hides_everything() {
        let mut scene = SceneModel::new(2, 2, 3);
        scene.set_visible(Handle::Vehicle(1), true);
        scene.set_text(Handle::Readout(Readout::Timestep), "Timestep: 3");

        scene.rebuild(3, 4, 3);
        assert_eq!(scene.tiles.len(), 3);
        assert_eq!(scene.vehicles.len(), 4);
        assert_eq!(scene.visible_count(), 0);
        assert_eq!(scene.readout(Readout::Timestep), "");
    }
}
