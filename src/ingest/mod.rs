//! CSV ingestion for measurement files.
//!
//! Rows are `round,participant_id,value` with no header. Any row that is not
//! three integers fails the whole read. Blank lines are skipped.

pub mod discovery;

pub use discovery::resolve_sweep_files;

use crate::error::{PlotError, Result};
use crate::models::MeasurementRecord;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read every row of a measurement file.
pub fn read_records(path: &Path) -> Result<Vec<MeasurementRecord>> {
    let file = File::open(path).map_err(|e| PlotError::io(path, e))?;
    let records = parse_records(file, path)?;

    debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Parse rows from any reader. `source` is only used in error messages.
pub fn parse_records<R: Read>(reader: R, source: &Path) -> Result<Vec<MeasurementRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: MeasurementRecord = row.map_err(|e| PlotError::csv(source, e))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<Vec<MeasurementRecord>> {
        parse_records(text.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn test_parse_rows() {
        let records = parse("1,1,52000000\n2,1,48000000\n3,2,-7\n").unwrap();
        assert_eq!(
            records,
            vec![
                MeasurementRecord::new(1, 1, 52_000_000),
                MeasurementRecord::new(2, 1, 48_000_000),
                MeasurementRecord::new(3, 2, -7),
            ]
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let records = parse("4 , 2 , 100\n").unwrap();
        assert_eq!(records, vec![MeasurementRecord::new(4, 2, 100)]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let records = parse("1,1,10\n\n2,1,20\n\n").unwrap();
        assert_eq!(
            records,
            vec![MeasurementRecord::new(1, 1, 10), MeasurementRecord::new(2, 1, 20)]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_non_integer_field_fails() {
        let err = parse("1,1,10\n2,x,20\n").unwrap_err();
        match err {
            PlotError::Csv { path, line, .. } => {
                assert_eq!(path, PathBuf::from("test.csv"));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_fails() {
        assert!(matches!(parse("1,1\n"), Err(PlotError::Csv { .. })));
        assert!(matches!(parse("1,1,10\n2,1\n"), Err(PlotError::Csv { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = read_records(Path::new("/nonexistent/roundLatency.csv")).unwrap_err();
        assert!(matches!(err, PlotError::Io { .. }));
    }

    #[test]
    fn test_read_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/roundLatency.csv");
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 12);
        assert_eq!(records[0], MeasurementRecord::new(1, 1, 912_000_000));
    }
}
