use crate::core::{SegmentError, TrafficRecord};

/// Records of one segment, replayed as an endless loop
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<TrafficRecord>,
    cursor: usize,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held records and rewind to the first one.
    ///
    /// Records are ordered by `time_step`; ties keep their incoming order.
    /// An empty input clears the store and is reported as `EmptySegment`.
    pub fn load(&mut self, mut records: Vec<TrafficRecord>) -> Result<(), SegmentError> {
        self.cursor = 0;
        if records.is_empty() {
            self.records.clear();
            return Err(SegmentError::EmptySegment);
        }

        records.sort_by_key(|r| r.time_step);
        self.records = records;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
    }

    /// Record under the cursor
    pub fn current(&self) -> Option<&TrafficRecord> {
        self.records.get(self.cursor)
    }

    /// Return the record under the cursor and step past it, wrapping at the end
    pub fn advance(&mut self) -> Option<TrafficRecord> {
        let record = *self.records.get(self.cursor)?;
        self.cursor = (self.cursor + 1) % self.records.len();
        Some(record)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrafficRecord] {
        &self.records
    }
}
