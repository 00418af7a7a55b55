/// 0xRRGGBB color as handed to the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

/// Tint applied to every visible vehicle while a phantom jam is active
pub const JAM_TINT: Color = Color(0xFF4444);

impl Color {
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        Color((channel(r) << 16) | (channel(g) << 8) | channel(b))
    }

    /// RGBA floats in the layout imgui draw lists expect
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        [r, g, b, alpha]
    }

    /// Stable body color for the vehicle in pool slot `index`.
    ///
    /// Hues step by the golden ratio so neighbouring slots never look alike,
    /// and the red band around the jam tint is skipped.
    pub fn for_slot(index: usize) -> Self {
        const GOLDEN: f32 = 0.618_034;
        let mut h = (0.13 + index as f32 * GOLDEN).fract();
        if h < 0.06 || h > 0.94 {
            h = (h + 0.12).fract();
        }
        let (r, g, b) = hsv_to_rgb(h, 0.65, 0.9);
        Color::from_rgb(r, g, b)
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h = h * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (r + m, g + m, b + m)
}
