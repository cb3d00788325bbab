use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use csv::ByteRecord;

use crate::domain::entities::dataset::ColumnValue;
use crate::domain::errors::IngestError;
use crate::usecase::ports::source::{RawTable, TabularSource};

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TabularSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RawTable, IngestError> {
        let file = File::open(&self.path)
            .map_err(|err| IngestError::unavailable(self.describe(), err))?;
        read_csv(file, &self.describe())
    }
}

/// Reads CSV with the first record as headers. Records may be shorter or
/// longer than the header row; fully blank records are skipped. Bytes that
/// are not valid UTF-8 are replaced rather than rejected.
pub fn read_csv<R: Read>(input: R, location: &str) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.byte_records();

    let Some(header_record) = records.next() else {
        return Err(IngestError::empty(location));
    };
    let header_record =
        header_record.map_err(|err| IngestError::unavailable(location, err))?;
    let headers = decode_fields(&header_record)
        .enumerate()
        .map(|(idx, header)| {
            if idx == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|err| IngestError::unavailable(location, err))?;
        let cells: Vec<String> = decode_fields(&record).collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(cells.into_iter().map(ColumnValue::from_cell).collect());
    }

    Ok(RawTable { headers, rows })
}

fn decode_fields(record: &ByteRecord) -> impl Iterator<Item = String> + '_ {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_csv_keeps_short_rows_and_strips_bom() {
        let input = "\u{feff}Name,RollNo,CGPA,Batch\nAnn,1,8.5,2021\nBob,2,7\n\n";

        let table = read_csv(input.as_bytes(), "inline").expect("csv should parse");

        assert_eq!(table.headers, vec!["Name", "RollNo", "CGPA", "Batch"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].len(), 3);
        assert_eq!(table.rows[0][2].as_number(), Some(8.5));
    }

    #[test]
    fn read_csv_keeps_rows_with_non_utf8_bytes() {
        let input: &[u8] = b"RollNo,Name\n1,Ren\xE9\n2,Bob\n";

        let table = read_csv(input, "latin1.csv").expect("csv should parse");

        assert_eq!(table.headers, vec!["RollNo", "Name"]);
        assert_eq!(table.rows.len(), 2, "no row should be dropped");
        assert_eq!(table.rows[0][1].as_text(), "Ren\u{fffd}");
        assert_eq!(table.rows[1][1].as_text(), "Bob");
    }

    #[test]
    fn read_csv_without_any_record_is_empty_source() {
        let result = read_csv("".as_bytes(), "blank.csv");

        assert_eq!(result, Err(IngestError::empty("blank.csv")));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let source = CsvFileSource::new("/definitely/not/here/info.csv");

        let result = source.load();

        assert!(
            matches!(result, Err(IngestError::SourceUnavailable { .. })),
            "unexpected result: {result:?}"
        );
    }
}
