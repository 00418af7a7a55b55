/// Continuous animation parameters derived from one record.
///
/// Recomputed once per record advance and read by every render frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedAnimationState {
    /// Road units the background moves per frame
    pub scroll_speed: f32,

    /// Wheel rotation in radians per second
    pub rotation_speed: f32,

    /// Visible vehicles, never more than the pool capacity
    pub active_car_count: usize,

    /// Gap between consecutive vehicles in road units
    pub car_spacing: f32,

    /// Phantom jam in progress; forces `scroll_speed` to zero
    pub jam_active: bool,
}

impl DerivedAnimationState {
    /// Whether the background is moving at all
    pub fn is_moving(&self) -> bool {
        self.scroll_speed > 0.0
    }
}
