use crate::core::record::{RawField, SEGMENT_ID};
use crate::core::{SegmentError, TrafficRecord};
use serde_json::Value;

/// Load the records of `segment` from JSON.
///
/// Two shapes are understood:
/// - a segment payload `{ "segment_id": 3, "records": [ ... ] }`
/// - a flat array of rows, each carrying `road_segment_id`
pub fn records_for_segment(data: &[u8], segment: i64) -> Result<Vec<TrafficRecord>, SegmentError> {
    let value: Value = serde_json::from_slice(data)?;

    match &value {
        Value::Object(payload) => {
            if let Some(id) = payload.get("segment_id") {
                let id = RawField::Json(id).integer(0, "segment_id")?;
                if id != segment {
                    return Err(SegmentError::MalformedPayload(format!(
                        "payload is for segment {}, requested {}",
                        id, segment
                    )));
                }
            }

            let rows = payload
                .get("records")
                .and_then(Value::as_array)
                .ok_or_else(|| SegmentError::MalformedPayload("missing `records` array".into()))?;

            if rows.is_empty() {
                return Err(SegmentError::EmptySegment);
            }

            rows.iter()
                .enumerate()
                .map(|(row, value)| TrafficRecord::from_json(row, value).map_err(SegmentError::from))
                .collect()
        }
        Value::Array(rows) => {
            let mut records = Vec::new();
            for (row, value) in rows.iter().enumerate() {
                let id = value
                    .get(SEGMENT_ID)
                    .map(|id| RawField::Json(id).integer(row, SEGMENT_ID))
                    .transpose()?;

                match id {
                    Some(id) if id == segment => records.push(TrafficRecord::from_json(row, value)?),
                    Some(_) => {}
                    None => {
                        return Err(SegmentError::MalformedPayload(format!(
                            "row {} has no `{}`",
                            row, SEGMENT_ID
                        )))
                    }
                }
            }

            if records.is_empty() {
                return Err(SegmentError::SegmentNotFound(segment));
            }
            Ok(records)
        }
        _ => Err(SegmentError::MalformedPayload(
            "expected a segment object or an array of rows".into(),
        )),
    }
}

/// Every record in the JSON, whatever its segment.
///
/// A segment payload yields its `records`; a flat array yields all rows.
pub fn all_records(data: &[u8]) -> Result<Vec<TrafficRecord>, SegmentError> {
    let value: Value = serde_json::from_slice(data)?;

    let rows = match &value {
        Value::Object(payload) => payload
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| SegmentError::MalformedPayload("missing `records` array".into()))?,
        Value::Array(rows) => rows,
        _ => {
            return Err(SegmentError::MalformedPayload(
                "expected a segment object or an array of rows".into(),
            ))
        }
    };

    if rows.is_empty() {
        return Err(SegmentError::EmptySegment);
    }
    rows.iter()
        .enumerate()
        .map(|(row, value)| TrafficRecord::from_json(row, value).map_err(SegmentError::from))
        .collect()
}
