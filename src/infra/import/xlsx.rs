use std::io::{Cursor, Read, Seek};
use std::path::PathBuf;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use crate::domain::entities::dataset::ColumnValue;
use crate::domain::errors::IngestError;
use crate::usecase::ports::source::{RawTable, TabularSource};

pub struct WorkbookFileSource {
    path: PathBuf,
}

impl WorkbookFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TabularSource for WorkbookFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RawTable, IngestError> {
        let location = self.describe();
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|err| IngestError::unavailable(location.clone(), err))?;
        read_first_sheet(&mut workbook, &location)
    }
}

pub fn read_workbook_bytes(bytes: Vec<u8>, location: &str) -> Result<RawTable, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| IngestError::unavailable(location, err))?;
    read_first_sheet(&mut workbook, location)
}

fn read_first_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    location: &str,
) -> Result<RawTable, IngestError> {
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(IngestError::empty(location));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| IngestError::unavailable(format!("{location}#{sheet_name}"), err))?;
    range_to_table(&range).ok_or_else(|| IngestError::empty(location))
}

/// First row becomes the headers; `None` when the range has no rows.
pub fn range_to_table(range: &Range<Data>) -> Option<RawTable> {
    let mut rows = range.rows();
    let headers = rows.next()?.iter().map(cell_to_header).collect();
    let rows = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();
    Some(RawTable { headers, rows })
}

fn cell_to_header(cell: &Data) -> String {
    cell_to_value(cell).as_text().to_string()
}

pub fn cell_to_value(cell: &Data) -> ColumnValue {
    match cell {
        Data::String(v) => ColumnValue::from_cell(v.as_str()),
        Data::Float(v) => ColumnValue::number(*v),
        Data::Int(v) => ColumnValue::number(*v as f64),
        Data::Bool(v) => ColumnValue::Text(v.to_string()),
        Data::DateTime(v) => ColumnValue::Text(v.to_string()),
        Data::DateTimeIso(v) => ColumnValue::Text(v.to_string()),
        Data::DurationIso(v) => ColumnValue::Text(v.to_string()),
        Data::Error(v) => ColumnValue::Text(format!("{v:?}")),
        Data::Empty => ColumnValue::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_to_value_formats_whole_floats_without_fraction() {
        assert_eq!(cell_to_value(&Data::Float(12.0)).as_text(), "12");
        assert_eq!(cell_to_value(&Data::Float(8.25)).as_number(), Some(8.25));
        assert_eq!(cell_to_value(&Data::Int(7)).as_text(), "7");
        assert_eq!(cell_to_value(&Data::Empty), ColumnValue::empty());
    }

    #[test]
    fn range_to_table_uses_first_row_as_headers() {
        let mut range = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("CGPA".to_string()));
        range.set_value((1, 0), Data::String("Ann".to_string()));
        range.set_value((1, 1), Data::Float(9.1));

        let table = range_to_table(&range).expect("range has rows");

        assert_eq!(table.headers, vec!["Name", "CGPA"]);
        assert_eq!(table.rows.len(), 1, "blank trailing row is skipped");
        assert_eq!(table.rows[0][1].as_number(), Some(9.1));
    }

    #[test]
    fn garbage_bytes_are_source_unavailable() {
        let result = read_workbook_bytes(b"not a workbook".to_vec(), "upload.xlsx");

        assert!(matches!(result, Err(IngestError::SourceUnavailable { .. })));
    }
}
