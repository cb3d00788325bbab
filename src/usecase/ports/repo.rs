use std::sync::Arc;

use crate::domain::entities::dataset::{Dataset, StoreVersion};

/// A consistent view of the record store at one version.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub version: StoreVersion,
    pub dataset: Arc<Dataset>,
}

/// Holds the current dataset. Replacement is a whole-value swap, so readers
/// only ever observe a complete dataset.
pub trait RecordRepository: Send + Sync {
    fn snapshot(&self) -> StoreSnapshot;

    /// Swaps in `dataset` and returns the new version.
    fn replace(&self, dataset: Dataset) -> StoreVersion;
}
