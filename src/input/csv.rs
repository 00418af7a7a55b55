use crate::core::record::{RawField, REQUIRED_FIELDS, SEGMENT_ID};
use crate::core::{SegmentError, TrafficRecord};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Load the records of `segment` from a traffic dataset in CSV form.
///
/// Expected columns (any order, any case):
/// - time_step, road_segment_id, local_car_density,
///   average_speed_kmph, brake_events, phantom_jam_flag
///
/// The delimiter is sniffed from the header line (`,` `;` or tab). Rows of
/// other segments are skipped; a segment with no rows is `SegmentNotFound`.
pub fn records_for_segment(data: &[u8], segment: i64) -> Result<Vec<TrafficRecord>, SegmentError> {
    let records = read_rows(data, |id| id == segment)?;
    if records.is_empty() {
        return Err(SegmentError::SegmentNotFound(segment));
    }
    Ok(records)
}

/// Every record of the dataset, in file order, whatever its segment
pub fn all_records(data: &[u8]) -> Result<Vec<TrafficRecord>, SegmentError> {
    let records = read_rows(data, |_| true)?;
    if records.is_empty() {
        return Err(SegmentError::EmptySegment);
    }
    Ok(records)
}

fn read_rows(data: &[u8], keep: impl Fn(i64) -> bool) -> Result<Vec<TrafficRecord>, SegmentError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(sniff_delimiter(data))
        .trim(Trim::All)
        .from_reader(data);

    let headers = rdr.headers()?.clone();
    let columns = Columns::detect(&headers)?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let cells = result?;

        let segment_cell = cells.get(columns.segment).unwrap_or("");
        if !keep(RawField::Text(segment_cell).integer(row, SEGMENT_ID)?) {
            continue;
        }

        let record = TrafficRecord::from_fields(row, |name| {
            columns.index_of(name).and_then(|i| cells.get(i)).map(RawField::Text)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Pick the delimiter that splits the header line into the most columns
fn sniff_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|&b| b == b'\n').next().unwrap_or(&[]);
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|d| header.iter().filter(|&&b| b == *d).count())
        .filter(|d| header.contains(d))
        .unwrap_or(b',')
}

/// Column positions resolved from the header row
struct Columns {
    segment: usize,
    fields: Vec<(&'static str, usize)>,
}

impl Columns {
    fn detect(headers: &StringRecord) -> Result<Self, SegmentError> {
        let mut missing = Vec::new();

        let segment = find_column(headers, SEGMENT_ID);
        if segment.is_none() {
            missing.push(SEGMENT_ID.to_string());
        }

        let mut fields = Vec::with_capacity(REQUIRED_FIELDS.len());
        for &name in REQUIRED_FIELDS {
            match find_column(headers, name) {
                Some(idx) => fields.push((name, idx)),
                None => missing.push(name.to_string()),
            }
        }

        match segment {
            Some(segment) if missing.is_empty() => Ok(Self { segment, fields }),
            _ => Err(SegmentError::MissingColumns(missing)),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, idx)| *idx)
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordError;

    const DATASET: &str = "\
time_step,road_segment_id,local_car_density,average_speed_kmph,brake_events,phantom_jam_flag
2,1,12,64.5,1,0
1,1,8,80.0,0,0
1,2,30,15.0,6,1
3,1,25,9.5,4,1
";

    #[test]
    fn test_filters_by_segment() {
        let records = records_for_segment(DATASET.as_bytes(), 1).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], TrafficRecord::new(2, 64.5, 12, 1, false));
        assert!(records[2].phantom_jam_flag);
    }

    #[test]
    fn test_unknown_segment() {
        let result = records_for_segment(DATASET.as_bytes(), 9);
        assert!(matches!(result, Err(SegmentError::SegmentNotFound(9))));
    }

    #[test]
    fn test_semicolon_dataset_with_reordered_columns() {
        let data = "Road_Segment_ID;Phantom_Jam_Flag;Time_Step;Brake_Events;Average_Speed_Kmph;Local_Car_Density\n4;true;10;0;55.5;3\n";
        let records = records_for_segment(data.as_bytes(), 4).unwrap();
        assert_eq!(records, vec![TrafficRecord::new(10, 55.5, 3, 0, true)]);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let data = "time_step,road_segment_id,average_speed_kmph\n1,1,40\n";
        match records_for_segment(data.as_bytes(), 1) {
            Err(SegmentError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["local_car_density", "brake_events", "phantom_jam_flag"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_row_is_reported() {
        let data = "\
time_step,road_segment_id,local_car_density,average_speed_kmph,brake_events,phantom_jam_flag
1,1,8,80.0,0,0
2,1,-4,80.0,0,0
";
        let err = records_for_segment(data.as_bytes(), 1).unwrap_err();
        assert!(matches!(
            err,
            SegmentError::MalformedRecord(RecordError::OutOfRange { row: 1, field: "local_car_density", .. })
        ));
    }

    #[test]
    fn test_bad_rows_of_other_segments_are_ignored() {
        let data = "\
time_step,road_segment_id,local_car_density,average_speed_kmph,brake_events,phantom_jam_flag
1,1,8,80.0,0,0
2,2,x,y,z,w
";
        assert_eq!(records_for_segment(data.as_bytes(), 1).unwrap().len(), 1);
    }

    #[test]
    fn test_all_records_spans_segments() {
        let records = all_records(DATASET.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[2], TrafficRecord::new(1, 15.0, 30, 6, true));

        let header_only = "time_step,road_segment_id,local_car_density,average_speed_kmph,brake_events,phantom_jam_flag\n";
        assert!(matches!(all_records(header_only.as_bytes()), Err(SegmentError::EmptySegment)));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter(b"a;b;c\n"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter(b"single"), b',');
    }
}
