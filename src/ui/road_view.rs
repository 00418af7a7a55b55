use crate::playback::PlaybackConfig;
use crate::render::{Readout, SceneModel, TileSprite, VehicleSprite};
use imgui::{Condition, DrawListMut, Ui};

const SKY: [f32; 4] = [0.55, 0.75, 0.92, 1.0];
const GRASS: [f32; 4] = [0.32, 0.55, 0.28, 1.0];
const ASPHALT: [f32; 4] = [0.22, 0.22, 0.24, 1.0];
const LANE_MARK: [f32; 4] = [0.95, 0.95, 0.85, 1.0];
const POST: [f32; 4] = [0.85, 0.85, 0.85, 1.0];
const TIRE: [f32; 4] = [0.08, 0.08, 0.08, 1.0];
const SPOKE: [f32; 4] = [0.75, 0.75, 0.78, 1.0];
const GLASS: [f32; 4] = [0.75, 0.88, 0.98, 1.0];
const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BANNER: [f32; 4] = [1.0, 0.27, 0.27, 1.0];

const WHEEL_OFFSET_X: f32 = 18.0;
const WHEEL_OFFSET_Y: f32 = 14.0;
const WHEEL_RADIUS: f32 = 7.0;
const ROOF_RADIUS: f32 = 26.0;

/// Maps viewport units onto the window's content region, keeping the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub origin: [f32; 2],
    pub scale: f32,
}

impl ViewTransform {
    pub fn fit(origin: [f32; 2], avail: [f32; 2], config: &PlaybackConfig) -> Self {
        let scale = (avail[0] / config.viewport_width)
            .min(avail[1] / config.viewport_height)
            .max(0.01);
        Self { origin, scale }
    }

    pub fn point(&self, x: f32, y: f32) -> [f32; 2] {
        [self.origin[0] + x * self.scale, self.origin[1] + y * self.scale]
    }

    pub fn scaled(&self, v: f32) -> f32 {
        v * self.scale
    }
}

/// Window that paints the retained scene
pub struct RoadView {
    config: PlaybackConfig,
}

impl RoadView {
    pub fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, ui: &Ui, scene: &SceneModel) {
        ui.window("Road")
            .size([self.config.viewport_width * 0.8, self.config.viewport_height * 0.8 + 40.0], Condition::FirstUseEver)
            .position([10.0, 30.0], Condition::FirstUseEver)
            .build(|| {
                let avail = ui.content_region_avail();
                let view = ViewTransform::fit(ui.cursor_screen_pos(), avail, &self.config);
                let size = [view.scaled(self.config.viewport_width), view.scaled(self.config.viewport_height)];
                let max = [view.origin[0] + size[0], view.origin[1] + size[1]];

                let draw_list = ui.get_window_draw_list();
                draw_list.with_clip_rect_intersect(view.origin, max, || {
                    for tile in &scene.tiles {
                        self.draw_tile(&draw_list, &view, tile);
                    }
                    for vehicle in scene.visible_vehicles() {
                        draw_vehicle(&draw_list, &view, vehicle);
                    }
                    draw_readouts(&draw_list, &view, scene);
                });

                ui.dummy(size);
            });
    }

    /// One stretch of road: sky, verge, asphalt, lane dashes and verge posts.
    /// Dashes and posts are spaced so neighbouring tiles join seamlessly.
    fn draw_tile(&self, draw_list: &DrawListMut, view: &ViewTransform, tile: &TileSprite) {
        let w = self.config.viewport_width;
        let h = self.config.viewport_height;
        let top = tile.y - h / 2.0;
        let lane = self.config.lane_y;
        let road_top = lane - 40.0;
        let road_bottom = lane + 40.0;

        draw_list
            .add_rect(view.point(tile.x, top), view.point(tile.x + w, road_top - 30.0), SKY)
            .filled(true)
            .build();
        draw_list
            .add_rect(view.point(tile.x, road_top - 30.0), view.point(tile.x + w, top + h), GRASS)
            .filled(true)
            .build();
        draw_list
            .add_rect(view.point(tile.x, road_top), view.point(tile.x + w, road_bottom), ASPHALT)
            .filled(true)
            .build();

        let dash = w / 30.0;
        let mut x = tile.x;
        while x < tile.x + w {
            draw_list
                .add_line(view.point(x, road_bottom - 6.0), view.point(x + dash, road_bottom - 6.0), LANE_MARK)
                .thickness(view.scaled(3.0))
                .build();
            x += dash * 2.0;
        }

        let post_spacing = w / 6.0;
        for i in 0..6 {
            let px = tile.x + (i as f32 + 0.5) * post_spacing;
            draw_list
                .add_line(view.point(px, road_top - 4.0), view.point(px, road_top - 26.0), POST)
                .thickness(view.scaled(3.0))
                .build();
        }
    }
}

fn draw_vehicle(draw_list: &DrawListMut, view: &ViewTransform, vehicle: &VehicleSprite) {
    let (x, y) = (vehicle.x, vehicle.y);
    let body = vehicle.tint.to_rgba(1.0);

    // roof: upper half disc over the body
    let roof: Vec<[f32; 2]> = (0..=16)
        .map(|i| {
            let a = std::f32::consts::PI * (1.0 + i as f32 / 16.0);
            view.point(x + ROOF_RADIUS * a.cos(), y - 8.0 + ROOF_RADIUS * a.sin())
        })
        .collect();
    draw_list.add_polyline(roof, body).filled(true).build();

    draw_list
        .add_rect(view.point(x - 30.0, y - 5.0), view.point(x + 30.0, y + 17.0), body)
        .filled(true)
        .rounding(view.scaled(6.0))
        .build();
    draw_list
        .add_rect(view.point(x - 14.0, y - 20.0), view.point(x + 14.0, y - 8.0), GLASS)
        .filled(true)
        .rounding(view.scaled(2.0))
        .build();

    for (wheel, dx) in [-WHEEL_OFFSET_X, WHEEL_OFFSET_X].into_iter().enumerate() {
        let cx = x + dx;
        let cy = y + WHEEL_OFFSET_Y;
        draw_list
            .add_circle(view.point(cx, cy), view.scaled(WHEEL_RADIUS), TIRE)
            .filled(true)
            .num_segments(20)
            .build();
        for &angle in &vehicle.spokes[wheel] {
            let end = view.point(cx + WHEEL_RADIUS * angle.cos(), cy + WHEEL_RADIUS * angle.sin());
            draw_list
                .add_line(view.point(cx, cy), end, SPOKE)
                .thickness(view.scaled(1.0).max(1.0))
                .build();
        }
    }
}

fn draw_readouts(draw_list: &DrawListMut, view: &ViewTransform, scene: &SceneModel) {
    draw_list.add_text(view.point(20.0, 16.0), TEXT, scene.readout(Readout::Timestep));
    draw_list.add_text(view.point(20.0, 46.0), TEXT, scene.readout(Readout::Speed));

    let banner = scene.readout(Readout::JamBanner);
    if !banner.is_empty() {
        draw_list.add_text(view.point(20.0, 76.0), BANNER, banner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let config = PlaybackConfig::default();

        let wide = ViewTransform::fit([10.0, 20.0], [2900.0, 900.0], &config);
        assert_eq!(wide.scale, 1.2);
        assert_eq!(wide.point(0.0, 0.0), [10.0, 20.0]);

        let narrow = ViewTransform::fit([0.0, 0.0], [725.0, 750.0], &config);
        assert_eq!(narrow.scale, 0.5);
        assert_eq!(narrow.point(1450.0, 750.0), [725.0, 375.0]);
    }

    #[test]
    fn test_fit_never_collapses() {
        let config = PlaybackConfig::default();
        let view = ViewTransform::fit([0.0, 0.0], [0.0, -5.0], &config);
        assert!(view.scale > 0.0);
    }
}
