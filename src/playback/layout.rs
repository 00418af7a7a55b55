use super::PlaybackConfig;
use crate::core::{Color, DerivedAnimationState, JAM_TINT};
use crate::render::{Handle, RenderSurface};
use std::f32::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    pub spokes: Vec<f32>,
}

impl Wheel {
    fn new(spoke_count: usize) -> Self {
        let step = TAU / spoke_count as f32;
        Self {
            spokes: (0..spoke_count).map(|i| step * i as f32).collect(),
        }
    }
}

/// One reusable vehicle slot
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleVisual {
    pub index: usize,
    pub base_color: Color,
    pub tint: Color,
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    /// Rear and front wheel
    pub wheels: [Wheel; 2],
}

impl VehicleVisual {
    fn new(index: usize, x: f32, y: f32, spoke_count: usize) -> Self {
        let base_color = Color::for_slot(index);
        Self {
            index,
            base_color,
            tint: base_color,
            visible: false,
            x,
            y,
            wheels: [Wheel::new(spoke_count), Wheel::new(spoke_count)],
        }
    }
}

/// Fixed set of vehicle slots, allocated once per segment and only toggled afterwards
#[derive(Debug, Clone)]
pub struct VehiclePool {
    slots: Vec<VehicleVisual>,
    active: usize,
}

impl VehiclePool {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            slots: (0..config.capacity)
                .map(|i| VehicleVisual::new(i, config.left_edge, config.lane_y, config.spokes_per_wheel))
                .collect(),
            active: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots shown by the last layout
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn slots(&self) -> &[VehicleVisual] {
        &self.slots
    }

    pub fn visible_mut(&mut self) -> impl Iterator<Item = &mut VehicleVisual> {
        self.slots.iter_mut().filter(|v| v.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|v| v.visible).count()
    }

    /// Push every slot's full state to the surface
    pub fn sync<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        for vehicle in &self.slots {
            let handle = Handle::Vehicle(vehicle.index);
            surface.set_position(handle, vehicle.x, vehicle.y);
            surface.set_tint(handle, vehicle.tint);
            surface.set_visible(handle, vehicle.visible);
            for (w, wheel) in vehicle.wheels.iter().enumerate() {
                for (s, angle) in wheel.spokes.iter().enumerate() {
                    surface.set_rotation(Handle::Spoke { vehicle: vehicle.index, wheel: w, spoke: s }, *angle);
                }
            }
        }
    }
}

/// Spread the first `active_car_count` slots evenly along the lane and hide the rest
pub fn layout<S: RenderSurface + ?Sized>(
    pool: &mut VehiclePool,
    state: &DerivedAnimationState,
    config: &PlaybackConfig,
    surface: &mut S,
) {
    let active = state.active_car_count.min(pool.slots.len());

    for (i, vehicle) in pool.slots.iter_mut().enumerate() {
        let handle = Handle::Vehicle(i);

        if i < active {
            vehicle.visible = true;
            vehicle.x = config.left_edge + i as f32 * state.car_spacing;
            vehicle.y = config.lane_y;
            vehicle.tint = if state.jam_active { JAM_TINT } else { vehicle.base_color };

            surface.set_position(handle, vehicle.x, vehicle.y);
            surface.set_tint(handle, vehicle.tint);
            surface.set_visible(handle, true);
        } else {
            vehicle.visible = false;
            surface.set_visible(handle, false);
        }
    }

    pool.active = active;
}
