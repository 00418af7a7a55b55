use super::record::RecordError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a segment could not be loaded or played.
///
/// Every variant is recoverable: the user fixes the input or the dataset and
/// triggers the load again.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("segment id `{0}` is not an integer")]
    InvalidInput(String),

    #[error("no data for segment {0}")]
    SegmentNotFound(i64),

    #[error("segment has no records")]
    EmptySegment,

    #[error(transparent)]
    MalformedRecord(#[from] RecordError),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("dataset is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record source failed: {0}")]
    Source(String),
}
