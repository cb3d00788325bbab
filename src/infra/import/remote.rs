use chrono::Utc;

use crate::domain::errors::IngestError;
use crate::infra::import::csv::read_csv;
use crate::infra::import::location::SourceFormat;
use crate::infra::import::xlsx::read_workbook_bytes;
use crate::usecase::ports::source::{RawTable, TabularSource};

/// Dataset fetched over HTTP; every request gets a fresh `t=` parameter so
/// intermediaries never serve a stale copy.
pub struct RemoteSource {
    url: String,
    format: SourceFormat,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            url: url.into(),
            format,
        }
    }
}

pub fn cache_busted_url(url: &str, stamp_millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={stamp_millis}")
}

impl TabularSource for RemoteSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load(&self) -> Result<RawTable, IngestError> {
        let request_url = cache_busted_url(&self.url, Utc::now().timestamp_millis());
        let bytes = reqwest::blocking::get(&request_url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|err| IngestError::unavailable(self.describe(), err))?;

        match self.format {
            SourceFormat::Csv => read_csv(&bytes[..], &self.url),
            SourceFormat::Workbook => read_workbook_bytes(bytes.to_vec(), &self.url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_buster_respects_existing_query() {
        assert_eq!(
            cache_busted_url("https://host/info.csv", 42),
            "https://host/info.csv?t=42"
        );
        assert_eq!(
            cache_busted_url("https://host/info.csv?v=2", 42),
            "https://host/info.csv?v=2&t=42"
        );
    }
}
