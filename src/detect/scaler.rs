use super::{Point, FEATURES};
use serde::{Deserialize, Serialize};

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Point,
    pub scale: Point,
}

impl StandardScaler {
    /// Fit on `points`. Uses the population standard deviation; a constant
    /// feature gets a scale of 1 so it maps to 0 instead of NaN.
    pub fn fit(points: &[Point]) -> Self {
        let n = points.len().max(1) as f64;
        let mut mean = [0.0; FEATURES];
        for p in points {
            for (m, x) in mean.iter_mut().zip(p) {
                *m += x / n;
            }
        }

        let mut scale = [0.0; FEATURES];
        for p in points {
            for f in 0..FEATURES {
                scale[f] += (p[f] - mean[f]).powi(2) / n;
            }
        }
        for s in &mut scale {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { mean, scale }
    }

    pub fn transform(&self, point: &Point) -> Point {
        std::array::from_fn(|f| (point[f] - self.mean[f]) / self.scale[f])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_population_std() {
        let scaler = StandardScaler::fit(&[[1.0, 10.0, 4.0], [3.0, 30.0, 4.0]]);
        assert_eq!(scaler.mean, [2.0, 20.0, 4.0]);
        assert_eq!(scaler.scale, [1.0, 10.0, 1.0]);
        assert_eq!(scaler.transform(&[3.0, 0.0, 4.0]), [1.0, -2.0, 0.0]);
    }

    #[test]
    fn test_fit_empty_is_identity() {
        let scaler = StandardScaler::fit(&[]);
        assert_eq!(scaler.transform(&[1.5, -2.0, 3.0]), [1.5, -2.0, 3.0]);
    }
}
