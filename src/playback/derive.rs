use super::PlaybackConfig;
use crate::core::{DerivedAnimationState, TrafficRecord};

/// Speed at which the background runs at `base_scroll_speed`
pub const REFERENCE_SPEED_KMPH: f64 = 120.0;

/// Lowest share of the base speed a moving road falls to
pub const MIN_SPEED_FACTOR: f64 = 0.1;

/// Scroll lost per brake event
pub const BRAKE_PENALTY: f64 = 0.6;

/// Slowest scroll outside a phantom jam
pub const MIN_SCROLL_SPEED: f32 = 0.3;

/// Wheel radians per second for each km/h
pub const ROTATION_PER_KMPH: f64 = 0.04;

/// Map one record onto the animation parameters it implies
pub fn derive_state(record: &TrafficRecord, config: &PlaybackConfig) -> DerivedAnimationState {
    let speed_factor = (record.average_speed_kmph / REFERENCE_SPEED_KMPH).clamp(MIN_SPEED_FACTOR, 1.0);
    let braking_effect = f64::from(record.brake_events) * BRAKE_PENALTY;
    let raw_scroll = f64::from(config.base_scroll_speed) * speed_factor - braking_effect;

    // A jam stops the road outright; the floor only keeps ordinary traffic moving.
    let scroll_speed = if record.phantom_jam_flag {
        0.0
    } else {
        (raw_scroll as f32).max(MIN_SCROLL_SPEED)
    };

    let active_car_count = (record.local_car_density as usize).min(config.capacity);
    let car_spacing = config.road_length / active_car_count.max(1) as f32;

    DerivedAnimationState {
        scroll_speed,
        rotation_speed: (record.average_speed_kmph * ROTATION_PER_KMPH) as f32,
        active_car_count,
        car_spacing,
        jam_active: record.phantom_jam_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlaybackConfig {
        PlaybackConfig::default()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_free_flow_record() {
        let config = PlaybackConfig {
            base_scroll_speed: 6.0,
            ..config()
        };
        let state = derive_state(&TrafficRecord::new(0, 100.0, 5, 0, false), &config);

        assert_eq!(state.active_car_count, 5);
        assert!(approx(state.car_spacing, config.road_length / 5.0));
        assert!(approx(state.scroll_speed, 6.0 * 100.0 / 120.0));
        assert!(approx(state.rotation_speed, 4.0));
        assert!(!state.jam_active);
    }

    #[test]
    fn test_dense_braking_record_hits_floor() {
        let state = derive_state(&TrafficRecord::new(0, 20.0, 40, 1, false), &config());

        assert_eq!(state.active_car_count, 30);
        assert_eq!(state.scroll_speed, MIN_SCROLL_SPEED);
        assert!(approx(state.rotation_speed, 0.8));
    }

    #[test]
    fn test_jam_forces_exact_zero() {
        let state = derive_state(&TrafficRecord::new(0, 90.0, 10, 5, true), &config());

        assert_eq!(state.scroll_speed, 0.0);
        assert!(state.jam_active);
        assert!(!state.is_moving());
    }

    #[test]
    fn test_jam_without_braking_is_still_zero() {
        let state = derive_state(&TrafficRecord::new(0, 120.0, 3, 0, true), &config());
        assert_eq!(state.scroll_speed, 0.0);
    }

    #[test]
    fn test_zero_density_spacing_uses_whole_road() {
        let config = config();
        let state = derive_state(&TrafficRecord::new(0, 50.0, 0, 0, false), &config);

        assert_eq!(state.active_car_count, 0);
        assert_eq!(state.car_spacing, config.road_length);
    }

    #[test]
    fn test_slow_traffic_uses_min_speed_factor() {
        let config = PlaybackConfig {
            base_scroll_speed: 10.0,
            ..config()
        };
        let state = derive_state(&TrafficRecord::new(0, 1.0, 1, 0, false), &config);
        assert!(approx(state.scroll_speed, 1.0));
    }

    #[test]
    fn test_scroll_zero_iff_jam() {
        let config = config();
        for speed in [0.0, 5.0, 60.0, 119.0, 150.0] {
            for brakes in [0, 1, 4, 50] {
                for jam in [false, true] {
                    let state = derive_state(&TrafficRecord::new(0, speed, 7, brakes, jam), &config);
                    assert_eq!(state.scroll_speed == 0.0, state.jam_active);
                    if !jam {
                        assert!(state.scroll_speed >= MIN_SCROLL_SPEED);
                    }
                }
            }
        }
    }

    #[test]
    fn test_count_and_spacing_for_all_densities() {
        let config = config();
        for density in 0..80u32 {
            let state = derive_state(&TrafficRecord::new(0, 40.0, density, 0, false), &config);
            let expected = (density as usize).min(config.capacity);
            assert_eq!(state.active_car_count, expected);
            assert!(approx(state.car_spacing, config.road_length / expected.max(1) as f32));
        }
    }

    #[test]
    fn test_rotation_tracks_speed() {
        for speed in [0.0, 12.5, 80.0, 240.0] {
            let state = derive_state(&TrafficRecord::new(0, speed, 1, 0, false), &config());
            assert!(approx(state.rotation_speed, (speed * 0.04) as f32));
        }
    }
}
