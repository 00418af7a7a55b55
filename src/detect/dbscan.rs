use super::Point;

pub fn distance(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// DBSCAN core samples of `points`: every point with at least `min_samples`
/// points (itself included) within `eps`.
///
/// Only the core set is needed to describe the dense region, so clusters are
/// never labelled.
pub fn core_samples(points: &[Point], eps: f64, min_samples: usize) -> Vec<Point> {
    points
        .iter()
        .filter(|p| points.iter().filter(|q| distance(p, q) <= eps).count() >= min_samples)
        .copied()
        .collect()
}

/// Distance from `point` to the closest core sample; infinite with no cores
pub fn nearest_core_distance(point: &Point, cores: &[Point]) -> f64 {
    cores
        .iter()
        .map(|c| distance(point, c))
        .fold(f64::INFINITY, f64::min)
}
