use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::dataset::{Dataset, HeaderManifest, Record, StoreVersion};
use crate::domain::errors::IngestError;
use crate::infra::import::location::{open_path, open_source};
use crate::usecase::ports::repo::RecordRepository;
use crate::usecase::ports::source::{RawTable, TabularSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub version: StoreVersion,
    pub location: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// A source read and normalized but not yet swapped into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub location: String,
    pub dataset: Dataset,
}

/// Reads and normalizes the whole source. Touches no shared state, so it can
/// run off the UI thread.
pub fn load_dataset(source: &dyn TabularSource) -> Result<LoadedDataset, IngestError> {
    let location = source.describe();
    let dataset = source
        .load()
        .and_then(|raw| build_dataset(raw, &location))
        .inspect_err(|err| warn!(%location, "ingestion failed: {err}"))?;
    Ok(LoadedDataset { location, dataset })
}

pub fn load_location(location: &str) -> Result<LoadedDataset, IngestError> {
    let source = open_source(location)?;
    load_dataset(source.as_ref())
}

pub fn load_path(path: &Path) -> Result<LoadedDataset, IngestError> {
    let source = open_path(path)?;
    load_dataset(source.as_ref())
}

pub struct ImportService {
    repo: Arc<dyn RecordRepository>,
}

impl ImportService {
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self { repo }
    }

    /// Swaps a loaded dataset into the store in one step.
    pub fn commit(&self, loaded: LoadedDataset) -> ImportResult {
        let LoadedDataset { location, dataset } = loaded;
        let row_count = dataset.len();
        let column_count = dataset.manifest().len();
        let version = self.repo.replace(dataset);
        info!(%location, row_count, column_count, version = version.0, "dataset ingested");

        ImportResult {
            version,
            location,
            row_count,
            column_count,
        }
    }

    /// On any error the previous dataset stays in place.
    #[cfg(test)]
    pub fn ingest(&self, source: &dyn TabularSource) -> Result<ImportResult, IngestError> {
        load_dataset(source).map(|loaded| self.commit(loaded))
    }
}

/// Turns raw cells into a dataset: unique headers, one value per column in
/// every record, short rows padded with empty text.
pub fn build_dataset(raw: RawTable, location: &str) -> Result<Dataset, IngestError> {
    if raw.rows.is_empty() {
        return Err(IngestError::empty(location));
    }
    let manifest = HeaderManifest::from_raw(&raw.headers);
    let records = raw.rows.into_iter().map(Record::new).collect();
    Ok(Dataset::new(manifest, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::dataset::ColumnValue;
    use crate::infra::memory::store::MemoryRepo;

    struct FixedSource(Result<RawTable, IngestError>);

    impl TabularSource for FixedSource {
        fn describe(&self) -> String {
            "fixture".to_string()
        }

        fn load(&self) -> Result<RawTable, IngestError> {
            self.0.clone()
        }
    }

    fn cells(values: &[&str]) -> Vec<ColumnValue> {
        values.iter().copied().map(ColumnValue::from_cell).collect()
    }

    #[test]
    fn short_rows_are_padded_not_dropped() {
        let raw = RawTable {
            headers: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            rows: vec![
                cells(&["1", "2", "3", "4"]),
                cells(&["5", "6", "7"]),
                cells(&["8", "9", "10", "11"]),
            ],
        };

        let dataset = build_dataset(raw, "fixture").expect("should build");

        assert_eq!(dataset.len(), 3);
        for record in dataset.records() {
            assert_eq!(record.values().len(), 4);
        }
        assert_eq!(dataset.value(1, "d"), Some(&ColumnValue::empty()));
    }

    #[test]
    fn failed_ingestion_leaves_store_untouched() {
        let repo = Arc::new(MemoryRepo::new());
        let service = ImportService::new(repo.clone());
        let good = FixedSource(Ok(RawTable {
            headers: vec!["Name".into()],
            rows: vec![cells(&["Ann"])],
        }));
        service.ingest(&good).expect("first ingestion should succeed");
        let before = repo.snapshot();

        let empty = FixedSource(Ok(RawTable {
            headers: vec!["Name".into()],
            rows: Vec::new(),
        }));
        let unavailable = FixedSource(Err(IngestError::unavailable("fixture", "gone")));

        assert_eq!(service.ingest(&empty), Err(IngestError::empty("fixture")));
        assert!(matches!(
            service.ingest(&unavailable),
            Err(IngestError::SourceUnavailable { .. })
        ));

        let after = repo.snapshot();
        assert_eq!(after.version, before.version);
        assert!(Arc::ptr_eq(&after.dataset, &before.dataset));
    }

    #[test]
    fn loading_leaves_store_alone_until_commit() {
        let repo = Arc::new(MemoryRepo::new());
        let service = ImportService::new(repo.clone());
        let source = FixedSource(Ok(RawTable {
            headers: vec!["RollNo".into(), "Name".into()],
            rows: vec![cells(&["1", "Ann"]), cells(&["2", "Bob"])],
        }));

        let loaded = load_dataset(&source).expect("should load");
        assert_eq!(repo.snapshot().version, StoreVersion::default());
        assert_eq!(loaded.location, "fixture");

        let result = service.commit(loaded);

        assert_eq!(result.row_count, 2);
        assert_eq!(result.column_count, 2);
        assert_eq!(repo.snapshot().version, result.version);
        assert_ne!(result.version, StoreVersion::default());
    }
}
