//! Phantom-jam detection over a whole dataset.
//!
//! Normal traffic is modelled as the DBSCAN core samples of the non-jam
//! training rows in standardized feature space. A row's anomaly score is its
//! distance to the nearest core sample; rows scoring above a threshold picked
//! from the training jams are predicted as jams.

pub mod dbscan;
pub mod report;
pub mod scaler;
pub mod split;

pub use report::DetectionReport;

use crate::core::{SegmentError, TrafficRecord};
use report::ConfusionMatrix;
use scaler::StandardScaler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Car density, speed and brake events
pub const FEATURES: usize = 3;

pub type Point = [f64; FEATURES];

/// Percentile of the training jam scores used as threshold
const JAM_PERCENTILE: f64 = 30.0;

/// Percentile of all training scores used when the training rows hold no jam
const FALLBACK_PERCENTILE: f64 = 95.0;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid detector parameters: {0}")]
    InvalidParams(String),

    #[error("need at least 2 records to split, got {0}")]
    TooFewRecords(usize),

    #[error("training rows contain no normal traffic")]
    NoNormalTraffic,

    #[error("no core samples at eps = {eps} and min_samples = {min_samples}")]
    NoCoreSamples { eps: f64, min_samples: usize },

    #[error(transparent)]
    Dataset(#[from] SegmentError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tuning knobs, defaulting to the values the detector was calibrated with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub eps: f64,
    pub min_samples: usize,
    pub test_size: f64,
    pub seed: u64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            eps: 0.55,
            min_samples: 4,
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), DetectError> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(DetectError::InvalidParams(format!("eps must be positive, got {}", self.eps)));
        }
        if self.min_samples == 0 {
            return Err(DetectError::InvalidParams("min_samples must be at least 1".into()));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(DetectError::InvalidParams(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

pub fn features(record: &TrafficRecord) -> Point {
    [
        record.local_car_density as f64,
        record.average_speed_kmph,
        record.brake_events as f64,
    ]
}

/// Linear-interpolated percentile of `values`; `p` in 0..=100
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// A fitted detector; serializable so it can be saved next to the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JamDetector {
    pub scaler: StandardScaler,
    pub core_samples: Vec<Point>,
    pub threshold: f64,
}

impl JamDetector {
    /// Fit on labelled training records
    pub fn fit(records: &[TrafficRecord], params: &DetectorParams) -> Result<Self, DetectError> {
        let points: Vec<Point> = records.iter().map(features).collect();
        let scaler = StandardScaler::fit(&points);
        let scaled: Vec<Point> = points.iter().map(|p| scaler.transform(p)).collect();

        let normal: Vec<Point> = scaled
            .iter()
            .zip(records)
            .filter(|(_, r)| !r.phantom_jam_flag)
            .map(|(p, _)| *p)
            .collect();
        if normal.is_empty() {
            return Err(DetectError::NoNormalTraffic);
        }

        let core_samples = dbscan::core_samples(&normal, params.eps, params.min_samples);
        if core_samples.is_empty() {
            return Err(DetectError::NoCoreSamples {
                eps: params.eps,
                min_samples: params.min_samples,
            });
        }

        let scores: Vec<f64> = scaled
            .iter()
            .map(|p| dbscan::nearest_core_distance(p, &core_samples))
            .collect();
        let jam_scores: Vec<f64> = scores
            .iter()
            .zip(records)
            .filter(|(_, r)| r.phantom_jam_flag)
            .map(|(s, _)| *s)
            .collect();

        let threshold = if jam_scores.is_empty() {
            percentile(&scores, FALLBACK_PERCENTILE)
        } else {
            percentile(&jam_scores, JAM_PERCENTILE)
        };

        debug!(normal = normal.len(), cores = core_samples.len(), threshold, "fitted jam detector");
        Ok(Self {
            scaler,
            core_samples,
            threshold,
        })
    }

    /// Distance to the nearest core sample in standardized space
    pub fn score(&self, record: &TrafficRecord) -> f64 {
        dbscan::nearest_core_distance(&self.scaler.transform(&features(record)), &self.core_samples)
    }

    pub fn is_jam(&self, record: &TrafficRecord) -> bool {
        self.score(record) > self.threshold
    }

    pub fn save(&self, path: &Path) -> Result<(), DetectError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Split, fit on the training rows and score the held-out rows
pub fn evaluate(records: &[TrafficRecord], params: &DetectorParams) -> Result<(JamDetector, DetectionReport), DetectError> {
    params.validate()?;
    if records.len() < 2 {
        return Err(DetectError::TooFewRecords(records.len()));
    }

    let labels: Vec<bool> = records.iter().map(|r| r.phantom_jam_flag).collect();
    let split = split::stratified_split(&labels, params.test_size, params.seed);
    if split.test.is_empty() {
        return Err(DetectError::TooFewRecords(records.len()));
    }

    let train: Vec<TrafficRecord> = split.train.iter().map(|&i| records[i]).collect();
    let detector = JamDetector::fit(&train, params)?;

    let actual: Vec<bool> = split.test.iter().map(|&i| labels[i]).collect();
    let predicted: Vec<bool> = split.test.iter().map(|&i| detector.is_jam(&records[i])).collect();
    let matrix = ConfusionMatrix::from_predictions(&actual, &predicted);

    info!(
        train = train.len(),
        test = split.test.len(),
        accuracy = matrix.accuracy(),
        f1 = matrix.f1(),
        "evaluated jam detector"
    );

    let report = DetectionReport {
        threshold: detector.threshold,
        core_samples: detector.core_samples.len(),
        train_rows: train.len(),
        matrix,
    };
    Ok((detector, report))
}
