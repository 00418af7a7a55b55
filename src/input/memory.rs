use super::RecordSource;
use crate::core::{SegmentError, TrafficRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Record source backed by segments held in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    segments: HashMap<i64, Vec<TrafficRecord>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment(mut self, segment: i64, records: Vec<TrafficRecord>) -> Self {
        self.insert(segment, records);
        self
    }

    pub fn insert(&mut self, segment: i64, records: Vec<TrafficRecord>) {
        self.segments.insert(segment, records);
    }

    /// Number of fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Synthetic segments 1..=3 for running without a dataset.
    ///
    /// Each one cycles through free flow, a slowdown with braking and a
    /// phantom jam, with density rising as speed falls.
    pub fn demo() -> Self {
        let mut source = Self::new();
        for segment in 1..=3i64 {
            let records = (0..40)
                .map(|step| {
                    let phase = (step as f64 / 40.0) * std::f64::consts::TAU + segment as f64;
                    let speed = (70.0 + 50.0 * phase.cos()).max(0.0);
                    let density = (30.0 - speed / 5.0).round().max(1.0) as u32 + segment as u32;
                    let brakes = if speed < 40.0 { ((40.0 - speed) / 8.0) as u32 } else { 0 };
                    let jam = speed < 30.0 && step % 3 != 0;
                    TrafficRecord::new(step, (speed * 10.0).round() / 10.0, density, brakes, jam)
                })
                .collect();
            source.insert(segment, records);
        }
        source
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_segment(&self, segment: i64) -> Result<Vec<TrafficRecord>, SegmentError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        match self.segments.get(&segment) {
            Some(records) if records.is_empty() => Err(SegmentError::EmptySegment),
            Some(records) => Ok(records.clone()),
            None => Err(SegmentError::SegmentNotFound(segment)),
        }
    }
}
