pub mod csv;
pub mod json;
pub mod memory;

pub use memory::MemorySource;

use crate::core::{SegmentError, TrafficRecord};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Anything that can hand over the records of one road segment
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_segment(&self, segment: i64) -> Result<Vec<TrafficRecord>, SegmentError>;
}

/// Parse user input into a segment id. Surrounding whitespace is ignored;
/// anything else that is not an integer is rejected.
pub fn parse_segment_id(input: &str) -> Result<i64, SegmentError> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| SegmentError::InvalidInput(trimmed.to_string()))
}

/// Dataset format detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
    Unknown,
}

/// Detect the format of a dataset by looking at its first meaningful byte
pub fn detect_format(data: &[u8]) -> DatasetFormat {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => DatasetFormat::Json,
        Some(_) if is_csv(data) => DatasetFormat::Csv,
        _ => DatasetFormat::Unknown,
    }
}

fn is_csv(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(500)];
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // a multi-byte character may straddle the sample boundary
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default(),
        Err(_) => return false,
    };
    text.lines()
        .next()
        .is_some_and(|line| [',', ';', '\t'].iter().any(|d| line.contains(*d)))
}

/// Parse a whole dataset held in memory
pub fn records_for_segment(data: &[u8], segment: i64) -> Result<Vec<TrafficRecord>, SegmentError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match detect_format(data) {
        DatasetFormat::Csv => csv::records_for_segment(data, segment),
        DatasetFormat::Json => json::records_for_segment(data, segment),
        DatasetFormat::Unknown => Err(SegmentError::Source("unrecognized dataset format".into())),
    }
}

/// Parse every record of a dataset held in memory, ignoring segments
pub fn all_records(data: &[u8]) -> Result<Vec<TrafficRecord>, SegmentError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match detect_format(data) {
        DatasetFormat::Csv => csv::all_records(data),
        DatasetFormat::Json => json::all_records(data),
        DatasetFormat::Unknown => Err(SegmentError::Source("unrecognized dataset format".into())),
    }
}

/// Reads a dataset file on every fetch, so edits show up on the next start
#[derive(Debug, Clone)]
pub struct DatasetFileSource {
    path: PathBuf,
    name: String,
}

impl DatasetFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

impl DatasetFileSource {
    /// Every record in the file, for whole-dataset analysis
    pub async fn fetch_all(&self) -> Result<Vec<TrafficRecord>, SegmentError> {
        let data = tokio::fs::read(&self.path).await.map_err(|source| SegmentError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes = data.len(), "read whole dataset");

        tokio::task::spawn_blocking(move || all_records(&data))
            .await
            .map_err(|e| SegmentError::Source(format!("dataset parser failed: {}", e)))?
    }
}

#[async_trait]
impl RecordSource for DatasetFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_segment(&self, segment: i64) -> Result<Vec<TrafficRecord>, SegmentError> {
        let data = tokio::fs::read(&self.path).await.map_err(|source| SegmentError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes = data.len(), segment, "read dataset");

        tokio::task::spawn_blocking(move || records_for_segment(&data, segment))
            .await
            .map_err(|e| SegmentError::Source(format!("dataset parser failed: {}", e)))?
    }
}
