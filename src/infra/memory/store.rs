use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::entities::dataset::{Dataset, StoreVersion};
use crate::usecase::ports::repo::{RecordRepository, StoreSnapshot};

/// Session-only record store. The dataset is wrapped in an `Arc` before the
/// lock is taken, so the write section is a pointer swap.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    current: RwLock<StoreSnapshot>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordRepository for MemoryRepo {
    fn snapshot(&self) -> StoreSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, dataset: Dataset) -> StoreVersion {
        let dataset = Arc::new(dataset);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let version = current.version.next();
        *current = StoreSnapshot { version, dataset };
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::dataset::{ColumnValue, HeaderManifest, Record};

    #[test]
    fn replace_bumps_version_and_keeps_old_snapshots_intact() {
        let repo = MemoryRepo::new();
        let before = repo.snapshot();
        assert_eq!(before.version, StoreVersion(0));
        assert!(before.dataset.is_empty());

        let dataset = Dataset::new(
            HeaderManifest::from_raw(["Name"]),
            vec![Record::new(vec![ColumnValue::from_cell("Ann")])],
        );
        let version = repo.replace(dataset);

        assert_eq!(version, StoreVersion(1));
        assert_eq!(repo.snapshot().dataset.len(), 1);
        assert!(before.dataset.is_empty(), "held snapshot must not change");
    }
}
