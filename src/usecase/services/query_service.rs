use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::domain::entities::dataset::{ColumnValue, Dataset, StoreVersion};
use crate::domain::entities::view::{BatchFilter, SortDirection, ViewState};
use crate::domain::errors::QueryError;
use crate::usecase::ports::repo::RecordRepository;

/// Rendered table: visible headers and, per displayed row, the text of each
/// visible column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableView {
    pub version: StoreVersion,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows that passed the filters, before the row limit.
    pub matching_rows: usize,
    pub total_rows: usize,
}

/// Generic cell ordering: numeric when both sides are numbers,
/// case-insensitive text when both are text. Numbers rank before text so the
/// order stays total on mixed columns.
pub fn compare_values(left: &ColumnValue, right: &ColumnValue) -> Ordering {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => l.total_cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left
            .as_text()
            .to_lowercase()
            .cmp(&right.as_text().to_lowercase()),
    }
}

/// Indices into `dataset.records()` in display order: batch filter, search
/// over visible columns, stable sort, then row limit. Also returns the
/// match count before truncation.
pub fn derive_rows(dataset: &Dataset, view: &ViewState) -> Result<(Vec<usize>, usize), QueryError> {
    let manifest = dataset.manifest();

    let batch = match view.batch_filter() {
        BatchFilter::All => None,
        BatchFilter::Only(value) => {
            let column_idx = manifest
                .batch_column()
                .ok_or_else(|| QueryError::unknown("batch"))?;
            Some((column_idx, value.as_str()))
        }
    };

    let visible_idx = view
        .visible_columns()
        .iter()
        .map(|column| {
            manifest
                .position(column)
                .ok_or_else(|| QueryError::unknown(column.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sort = view
        .sort()
        .map(|spec| {
            manifest
                .position(&spec.column)
                .map(|idx| (idx, spec.direction))
                .ok_or_else(|| QueryError::unknown(spec.column.clone()))
        })
        .transpose()?;

    let needle = view.search_query().trim().to_lowercase();

    let mut rows: Vec<usize> = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| match batch {
            Some((column_idx, value)) => record.text(column_idx) == value,
            None => true,
        })
        .filter(|(_, record)| {
            needle.is_empty()
                || visible_idx
                    .iter()
                    .any(|idx| record.text(*idx).to_lowercase().contains(&needle))
        })
        .map(|(row_idx, _)| row_idx)
        .collect();

    if let Some((column_idx, direction)) = sort {
        let records = dataset.records();
        let empty = ColumnValue::empty();
        rows.sort_by(|a, b| {
            let left = records[*a].get(column_idx).unwrap_or(&empty);
            let right = records[*b].get(column_idx).unwrap_or(&empty);
            let ordering = compare_values(left, right);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let matching = rows.len();
    rows.truncate(view.row_limit().apply(matching));
    Ok((rows, matching))
}

pub fn render_view(
    dataset: &Dataset,
    version: StoreVersion,
    view: &ViewState,
    rows: &[usize],
    matching_rows: usize,
) -> TableView {
    let manifest = dataset.manifest();
    let visible_idx: Vec<usize> = view
        .visible_columns()
        .iter()
        .filter_map(|column| manifest.position(column))
        .collect();
    let rendered = rows
        .iter()
        .filter_map(|row_idx| dataset.records().get(*row_idx))
        .map(|record| {
            visible_idx
                .iter()
                .map(|idx| record.text(*idx).to_string())
                .collect()
        })
        .collect();

    TableView {
        version,
        columns: view.visible_columns().to_vec(),
        rows: rendered,
        matching_rows,
        total_rows: dataset.len(),
    }
}

struct CachedView {
    version: StoreVersion,
    view: ViewState,
    table: Arc<TableView>,
}

/// Derives the displayed table from the store, recomputing only when the
/// store version or the view state changed since the last call.
pub struct QueryService {
    repo: Arc<dyn RecordRepository>,
    cache: Mutex<Option<CachedView>>,
}

impl QueryService {
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self {
            repo,
            cache: Mutex::new(None),
        }
    }

    pub fn table(&self, view: &ViewState) -> Result<Arc<TableView>, QueryError> {
        let snapshot = self.repo.snapshot();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref() {
            if cached.version == snapshot.version && &cached.view == view {
                return Ok(cached.table.clone());
            }
        }

        let (rows, matching) = derive_rows(&snapshot.dataset, view)?;
        let table = Arc::new(render_view(
            &snapshot.dataset,
            snapshot.version,
            view,
            &rows,
            matching,
        ));
        debug!(
            version = snapshot.version.0,
            shown = table.rows.len(),
            matching,
            "table view derived"
        );
        *cache = Some(CachedView {
            version: snapshot.version,
            view: view.clone(),
            table: table.clone(),
        });
        Ok(table)
    }

    /// Unfiltered dataset, as handed to the summary report.
    pub fn full_dataset(&self) -> Arc<Dataset> {
        self.repo.snapshot().dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::dataset::{HeaderManifest, Record};
    use crate::domain::entities::view::{RowLimit, SortSpec};
    use crate::infra::memory::store::MemoryRepo;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            HeaderManifest::from_raw(headers.iter().copied()),
            rows.iter()
                .map(|row| Record::new(row.iter().copied().map(ColumnValue::from_cell).collect()))
                .collect(),
        )
    }

    fn names(dataset: &Dataset, rows: &[usize], column: &str) -> Vec<String> {
        rows.iter()
            .map(|row| {
                dataset
                    .value(*row, column)
                    .map(|v| v.as_text().to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn all_visible(dataset: &Dataset) -> ViewState {
        let mut view = ViewState::for_manifest(dataset.manifest());
        for column in dataset.manifest().columns() {
            view.set_column_visible(dataset.manifest(), column, true)
                .expect("known column");
        }
        view
    }

    #[test]
    fn sort_is_case_insensitive() {
        let data = dataset(&["name", "batch"], &[&["Bob", "X"], &["ann", "Y"]]);
        let mut view = all_visible(&data);
        view.sort_by_column(data.manifest(), "name").expect("known column");

        let (rows, _) = derive_rows(&data, &view).expect("should derive");

        assert_eq!(names(&data, &rows, "name"), vec!["ann", "Bob"]);
    }

    #[test]
    fn sort_is_numeric_when_both_sides_are_numbers() {
        let data = dataset(&["cgpa"], &[&["10"], &["9.5"], &["n/a"], &["2"]]);
        let mut view = all_visible(&data);
        view.sort_by_column(data.manifest(), "cgpa").expect("known column");

        let (rows, _) = derive_rows(&data, &view).expect("should derive");

        assert_eq!(names(&data, &rows, "cgpa"), vec!["2", "9.5", "10", "n/a"]);
    }

    #[test]
    fn blank_cells_rank_after_numbers_ascending_and_first_descending() {
        let data = dataset(
            &["name", "cgpa"],
            &[&["Ann", ""], &["Bob", "7.5"], &["Cid", "9"], &["Dee", ""]],
        );
        let mut view = all_visible(&data);

        view.sort_by_column(data.manifest(), "cgpa").expect("known column");
        let (asc, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &asc, "name"), vec!["Bob", "Cid", "Ann", "Dee"]);

        view.sort_by_column(data.manifest(), "cgpa").expect("known column");
        let (desc, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &desc, "name"), vec!["Ann", "Dee", "Cid", "Bob"]);
    }

    #[test]
    fn ties_keep_source_order_in_both_directions() {
        let data = dataset(
            &["id", "batch"],
            &[&["1", "B"], &["2", "A"], &["3", "B"], &["4", "A"]],
        );
        let mut view = all_visible(&data);

        view.set_sort(
            data.manifest(),
            Some(SortSpec {
                column: "batch".to_string(),
                direction: SortDirection::Asc,
            }),
        )
        .expect("known column");
        let (asc, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &asc, "id"), vec!["2", "4", "1", "3"]);

        view.set_sort(
            data.manifest(),
            Some(SortSpec {
                column: "batch".to_string(),
                direction: SortDirection::Desc,
            }),
        )
        .expect("known column");
        let (desc, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &desc, "id"), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn search_only_looks_at_visible_columns() {
        let data = dataset(
            &["Name", "Phone"],
            &[&["Ann", "555-0101"], &["Bob", "555-0199"]],
        );
        let mut view = ViewState::for_manifest(data.manifest());
        assert_eq!(view.visible_columns(), &["Name"]);
        view.set_search_query("0199");

        let (hidden, _) = derive_rows(&data, &view).expect("should derive");
        assert!(hidden.is_empty(), "phone column is hidden");

        view.toggle_column(data.manifest(), "Phone").expect("known column");
        let (shown, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &shown, "Name"), vec!["Bob"]);

        view.set_search_query("  aNN ");
        let (case_insensitive, _) = derive_rows(&data, &view).expect("should derive");
        assert_eq!(names(&data, &case_insensitive, "Name"), vec!["Ann"]);
    }

    #[test]
    fn batch_filter_is_exact_match() {
        let data = dataset(
            &["Batch", "Name"],
            &[&["2021", "Ann"], &["2021A", "Bob"], &["2021", "Cid"]],
        );
        let mut view = ViewState::for_manifest(data.manifest());
        view.set_batch_filter(data.manifest(), BatchFilter::Only("2021".to_string()))
            .expect("batch column exists");

        let (rows, matching) = derive_rows(&data, &view).expect("should derive");

        assert_eq!(names(&data, &rows, "Name"), vec!["Ann", "Cid"]);
        assert_eq!(matching, 2);
    }

    #[test]
    fn row_limit_truncates_after_sorting() {
        let data = dataset(
            &["name"],
            &[&["e"], &["c"], &["a"], &["d"], &["b"]],
        );
        let mut view = all_visible(&data);
        view.sort_by_column(data.manifest(), "name").expect("known column");
        view.set_row_limit("2".parse::<RowLimit>().expect("valid limit"));

        let (rows, matching) = derive_rows(&data, &view).expect("should derive");

        assert_eq!(names(&data, &rows, "name"), vec!["a", "b"]);
        assert_eq!(matching, 5);
    }

    #[test]
    fn stale_view_columns_are_reported_not_ignored() {
        let old = dataset(&["name", "batch"], &[&["Ann", "X"]]);
        let mut view = all_visible(&old);
        view.sort_by_column(old.manifest(), "batch").expect("known column");
        let next = dataset(&["name"], &[&["Ann"]]);

        let result = derive_rows(&next, &view);

        assert_eq!(result.map(|_| ()), Err(QueryError::unknown("batch")));
    }

    #[test]
    fn table_is_memoized_per_version_and_view() {
        let repo = Arc::new(MemoryRepo::new());
        repo.replace(dataset(&["name"], &[&["b"], &["a"]]));
        let service = QueryService::new(repo.clone());
        let mut view = all_visible(&service.full_dataset());

        let first = service.table(&view).expect("should derive");
        let again = service.table(&view).expect("should derive");
        assert!(Arc::ptr_eq(&first, &again), "unchanged inputs reuse the cache");

        view.set_search_query("a");
        let searched = service.table(&view).expect("should derive");
        assert!(!Arc::ptr_eq(&first, &searched));
        assert_eq!(searched.rows, vec![vec!["a".to_string()]]);

        repo.replace(dataset(&["name"], &[&["a"], &["aa"]]));
        let reloaded = service.table(&view).expect("should derive");
        assert_eq!(reloaded.rows.len(), 2);
        assert_eq!(reloaded.total_rows, 2);
    }
}
