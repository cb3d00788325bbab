use std::path::Path;

use crate::domain::errors::IngestError;
use crate::infra::import::csv::CsvFileSource;
use crate::infra::import::remote::RemoteSource;
use crate::infra::import::xlsx::WorkbookFileSource;
use crate::usecase::ports::source::TabularSource;

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["csv", "xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Picks the reader from the extension, ignoring any query or fragment.
    pub fn detect(location: &str) -> Option<Self> {
        let without_query = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location);
        let ext = Path::new(without_query)
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())?;
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Workbook),
            _ => None,
        }
    }
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves a configured or picked location to a reader.
pub fn open_source(location: &str) -> Result<Box<dyn TabularSource>, IngestError> {
    let location = location.trim();
    let format = SourceFormat::detect(location).ok_or_else(|| IngestError::UnsupportedFormat {
        location: location.to_string(),
    })?;

    if is_remote(location) {
        return Ok(Box::new(RemoteSource::new(location, format)));
    }

    Ok(match format {
        SourceFormat::Csv => Box::new(CsvFileSource::new(location)),
        SourceFormat::Workbook => Box::new(WorkbookFileSource::new(location)),
    })
}

pub fn open_path(path: &Path) -> Result<Box<dyn TabularSource>, IngestError> {
    open_source(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_reads_extension_case_insensitively() {
        assert_eq!(SourceFormat::detect("Info.CSV"), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::detect("/data/students.xlsx"),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(
            SourceFormat::detect("https://host/info.csv?t=1"),
            Some(SourceFormat::Csv)
        );
        assert_eq!(SourceFormat::detect("notes.txt"), None);
        assert_eq!(SourceFormat::detect("README"), None);
    }

    #[test]
    fn open_source_rejects_unknown_extensions() {
        let result = open_source("roster.pdf").map(|source| source.describe());

        assert_eq!(
            result,
            Err(IngestError::UnsupportedFormat {
                location: "roster.pdf".to_string()
            })
        );
    }

    #[test]
    fn open_source_routes_http_to_remote() {
        let source = open_source("https://example.org/info.csv").expect("supported");

        assert_eq!(source.describe(), "https://example.org/info.csv");
        assert!(is_remote("HTTP://example.org/a.csv"));
        assert!(!is_remote("info.csv"));
    }
}
