use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire names of the record columns
pub const TIME_STEP: &str = "time_step";
pub const AVERAGE_SPEED: &str = "average_speed_kmph";
pub const CAR_DENSITY: &str = "local_car_density";
pub const BRAKE_EVENTS: &str = "brake_events";
pub const JAM_FLAG: &str = "phantom_jam_flag";
pub const SEGMENT_ID: &str = "road_segment_id";

/// Columns every record must carry
pub const REQUIRED_FIELDS: &[&str] = &[TIME_STEP, AVERAGE_SPEED, CAR_DENSITY, BRAKE_EVENTS, JAM_FLAG];

/// One timestep of aggregated traffic measurements for a road segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    /// Ordering key
    pub time_step: i64,

    /// Mean speed over the segment, km/h
    pub average_speed_kmph: f64,

    /// Cars on the segment at this timestep
    pub local_car_density: u32,

    /// Brake events observed during the timestep
    pub brake_events: u32,

    /// Whether the timestep was flagged as a phantom jam
    pub phantom_jam_flag: bool,
}

impl TrafficRecord {
    pub fn new(time_step: i64, average_speed_kmph: f64, local_car_density: u32, brake_events: u32, phantom_jam_flag: bool) -> Self {
        Self {
            time_step,
            average_speed_kmph,
            local_car_density,
            brake_events,
            phantom_jam_flag,
        }
    }

    /// Build a record from named fields, validating each against the schema.
    ///
    /// `row` is only used to label errors. `lookup` resolves a column name to
    /// its raw value, returning `None` when the column is absent.
    pub fn from_fields<'a, F>(row: usize, lookup: F) -> Result<Self, RecordError>
    where
        F: Fn(&'static str) -> Option<RawField<'a>>,
    {
        let field = |name: &'static str| lookup(name).ok_or(RecordError::MissingField { row, field: name });

        let time_step = field(TIME_STEP)?.integer(row, TIME_STEP)?;

        let average_speed_kmph = field(AVERAGE_SPEED)?.number(row, AVERAGE_SPEED)?;
        if average_speed_kmph < 0.0 {
            return Err(RecordError::OutOfRange {
                row,
                field: AVERAGE_SPEED,
                value: average_speed_kmph.to_string(),
            });
        }

        let local_car_density = field(CAR_DENSITY)?.count(row, CAR_DENSITY)?;
        let brake_events = field(BRAKE_EVENTS)?.count(row, BRAKE_EVENTS)?;
        let phantom_jam_flag = field(JAM_FLAG)?.flag(row, JAM_FLAG)?;

        Ok(Self {
            time_step,
            average_speed_kmph,
            local_car_density,
            brake_events,
            phantom_jam_flag,
        })
    }

    /// Validate a JSON object shaped like a record
    pub fn from_json(row: usize, value: &serde_json::Value) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or_else(|| RecordError::InvalidType {
            row,
            field: "record",
            expected: "object",
            found: json_kind(value).to_string(),
        })?;

        Self::from_fields(row, |name| object.get(name).map(RawField::Json))
    }
}

/// Schema violation in a single record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record {row}: missing field `{field}`")]
    MissingField { row: usize, field: &'static str },

    #[error("record {row}: field `{field}` expected {expected}, found {found}")]
    InvalidType {
        row: usize,
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("record {row}: field `{field}` out of range: {value}")]
    OutOfRange {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// A field value before validation, either from a JSON payload or a CSV cell
#[derive(Debug, Clone, Copy)]
pub enum RawField<'a> {
    Json(&'a serde_json::Value),
    Text(&'a str),
}

impl RawField<'_> {
    fn describe(&self) -> String {
        match self {
            RawField::Json(v) => format!("{} `{}`", json_kind(v), v),
            RawField::Text(s) => format!("`{}`", s),
        }
    }

    fn invalid(&self, row: usize, field: &'static str, expected: &'static str) -> RecordError {
        RecordError::InvalidType {
            row,
            field,
            expected,
            found: self.describe(),
        }
    }

    /// Finite number
    fn number(&self, row: usize, field: &'static str) -> Result<f64, RecordError> {
        let value = match self {
            RawField::Json(v) => v.as_f64(),
            RawField::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .ok_or_else(|| self.invalid(row, field, "number"))?;

        if !value.is_finite() {
            return Err(RecordError::OutOfRange {
                row,
                field,
                value: value.to_string(),
            });
        }
        Ok(value)
    }

    /// Number with no fractional part
    pub(crate) fn integer(&self, row: usize, field: &'static str) -> Result<i64, RecordError> {
        if let RawField::Json(v) = self {
            if let Some(i) = v.as_i64() {
                return Ok(i);
            }
        }

        let value = self.number(row, field)?;
        if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
            return Err(self.invalid(row, field, "integer"));
        }
        Ok(value as i64)
    }

    /// Non-negative integer that fits a u32
    fn count(&self, row: usize, field: &'static str) -> Result<u32, RecordError> {
        let value = self.integer(row, field)?;
        u32::try_from(value).map_err(|_| RecordError::OutOfRange {
            row,
            field,
            value: value.to_string(),
        })
    }

    /// Boolean; 0/1 integers and textual forms are accepted since dataset
    /// exports write the flag as an integer column.
    fn flag(&self, row: usize, field: &'static str) -> Result<bool, RecordError> {
        let parsed = match self {
            RawField::Json(serde_json::Value::Bool(b)) => Some(*b),
            RawField::Json(serde_json::Value::Number(n)) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            RawField::Json(_) => None,
            RawField::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        };

        parsed.ok_or_else(|| self.invalid(row, field, "boolean"))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_json_record() {
        let value = json!({
            "time_step": 4,
            "road_segment_id": 2,
            "average_speed_kmph": 87.5,
            "local_car_density": 12,
            "brake_events": 3,
            "phantom_jam_flag": false
        });

        let record = TrafficRecord::from_json(0, &value).unwrap();
        assert_eq!(record, TrafficRecord::new(4, 87.5, 12, 3, false));
    }

    #[test]
    fn test_integer_jam_flag_accepted() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": 10,
            "local_car_density": 0,
            "brake_events": 0,
            "phantom_jam_flag": 1
        });

        assert!(TrafficRecord::from_json(0, &value).unwrap().phantom_jam_flag);
    }

    #[test]
    fn test_missing_field_is_named() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": 10.0,
            "brake_events": 0,
            "phantom_jam_flag": false
        });

        assert_eq!(
            TrafficRecord::from_json(7, &value),
            Err(RecordError::MissingField { row: 7, field: CAR_DENSITY })
        );
    }

    #[test]
    fn test_negative_speed_rejected() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": -3.0,
            "local_car_density": 1,
            "brake_events": 0,
            "phantom_jam_flag": false
        });

        let err = TrafficRecord::from_json(0, &value).unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange { field: AVERAGE_SPEED, .. }));
    }

    #[test]
    fn test_fractional_density_rejected() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": 30.0,
            "local_car_density": 2.5,
            "brake_events": 0,
            "phantom_jam_flag": false
        });

        let err = TrafficRecord::from_json(0, &value).unwrap_err();
        assert!(matches!(err, RecordError::InvalidType { field: CAR_DENSITY, expected: "integer", .. }));
    }

    #[test]
    fn test_negative_brake_events_rejected() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": 30.0,
            "local_car_density": 2,
            "brake_events": -1,
            "phantom_jam_flag": false
        });

        let err = TrafficRecord::from_json(0, &value).unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange { field: BRAKE_EVENTS, .. }));
    }

    #[test]
    fn test_string_speed_in_json_rejected() {
        let value = json!({
            "time_step": 1,
            "average_speed_kmph": "fast",
            "local_car_density": 2,
            "brake_events": 0,
            "phantom_jam_flag": false
        });

        let err = TrafficRecord::from_json(3, &value).unwrap_err();
        assert_eq!(err.to_string(), "record 3: field `average_speed_kmph` expected number, found string `\"fast\"`");
    }

    #[test]
    fn test_text_fields() {
        let cells = [("time_step", "12"), ("average_speed_kmph", " 44.0 "), ("local_car_density", "8"), ("brake_events", "2"), ("phantom_jam_flag", "True")];
        let record = TrafficRecord::from_fields(0, |name| {
            cells.iter().find(|(k, _)| *k == name).map(|(_, v)| RawField::Text(*v))
        })
        .unwrap();

        assert_eq!(record, TrafficRecord::new(12, 44.0, 8, 2, true));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = TrafficRecord::from_json(0, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, RecordError::InvalidType { expected: "object", .. }));
    }

    #[test]
    fn test_non_finite_speed_cells_rejected() {
        for (cell, shown) in [("NaN", "NaN"), ("inf", "inf"), ("-inf", "-inf")] {
            let fields = [
                (TIME_STEP, "3"),
                (AVERAGE_SPEED, cell),
                (CAR_DENSITY, "5"),
                (BRAKE_EVENTS, "0"),
                (JAM_FLAG, "0"),
            ];
            let result = TrafficRecord::from_fields(2, |name| {
                fields.iter().find(|(n, _)| *n == name).map(|(_, v)| RawField::Text(*v))
            });

            assert_eq!(
                result,
                Err(RecordError::OutOfRange {
                    row: 2,
                    field: AVERAGE_SPEED,
                    value: shown.to_string(),
                }),
                "cell {:?}",
                cell
            );
        }
    }
}
