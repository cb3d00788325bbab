use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::domain::entities::dataset::HeaderManifest;
use crate::domain::errors::QueryError;

pub const ALL_OPTION_VALUE: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BatchFilter {
    #[default]
    All,
    Only(String),
}

impl BatchFilter {
    pub fn from_option(value: &str) -> Self {
        if value == ALL_OPTION_VALUE {
            BatchFilter::All
        } else {
            BatchFilter::Only(value.to_string())
        }
    }

    pub fn option_value(&self) -> &str {
        match self {
            BatchFilter::All => ALL_OPTION_VALUE,
            BatchFilter::Only(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowLimit {
    #[default]
    All,
    First(NonZeroUsize),
}

impl RowLimit {
    pub fn apply(self, len: usize) -> usize {
        match self {
            RowLimit::All => len,
            RowLimit::First(limit) => len.min(limit.get()),
        }
    }
}

impl FromStr for RowLimit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(ALL_OPTION_VALUE) {
            return Ok(RowLimit::All);
        }
        value
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .map(RowLimit::First)
            .ok_or_else(|| format!("row limit must be ALL or a positive integer, got {value:?}"))
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLimit::All => f.write_str(ALL_OPTION_VALUE),
            RowLimit::First(limit) => write!(f, "{limit}"),
        }
    }
}

/// Table view configuration. Every column it names exists in the manifest
/// it was last reconciled against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ViewState {
    visible_columns: Vec<String>,
    search_query: String,
    batch_filter: BatchFilter,
    row_limit: RowLimit,
    sort: Option<SortSpec>,
}

impl ViewState {
    #[cfg(test)]
    pub fn for_manifest(manifest: &HeaderManifest) -> Self {
        Self {
            visible_columns: manifest.default_visible_columns(),
            ..Self::default()
        }
    }

    pub fn visible_columns(&self) -> &[String] {
        &self.visible_columns
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn batch_filter(&self) -> &BatchFilter {
        &self.batch_filter
    }

    pub fn row_limit(&self) -> RowLimit {
        self.row_limit
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visible_columns.iter().any(|name| name == column)
    }

    /// Shows or hides `column`, keeping manifest order.
    pub fn set_column_visible(
        &mut self,
        manifest: &HeaderManifest,
        column: &str,
        visible: bool,
    ) -> Result<(), QueryError> {
        if !manifest.contains(column) {
            return Err(QueryError::unknown(column));
        }
        let next = manifest
            .columns()
            .iter()
            .filter(|name| {
                if name.as_str() == column {
                    visible
                } else {
                    self.is_visible(name)
                }
            })
            .cloned()
            .collect();
        self.visible_columns = next;
        Ok(())
    }

    pub fn toggle_column(
        &mut self,
        manifest: &HeaderManifest,
        column: &str,
    ) -> Result<(), QueryError> {
        let visible = !self.is_visible(column);
        self.set_column_visible(manifest, column, visible)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_batch_filter(
        &mut self,
        manifest: &HeaderManifest,
        filter: BatchFilter,
    ) -> Result<(), QueryError> {
        if matches!(filter, BatchFilter::Only(_)) && manifest.batch_column().is_none() {
            return Err(QueryError::unknown("batch"));
        }
        self.batch_filter = filter;
        Ok(())
    }

    pub fn set_row_limit(&mut self, limit: RowLimit) {
        self.row_limit = limit;
    }

    pub fn set_sort(
        &mut self,
        manifest: &HeaderManifest,
        sort: Option<SortSpec>,
    ) -> Result<(), QueryError> {
        if let Some(spec) = &sort {
            if !manifest.contains(&spec.column) {
                return Err(QueryError::unknown(spec.column.clone()));
            }
        }
        self.sort = sort;
        Ok(())
    }

    /// Header click: flips direction on the sorted column, otherwise sorts
    /// the clicked column ascending.
    pub fn sort_by_column(
        &mut self,
        manifest: &HeaderManifest,
        column: &str,
    ) -> Result<(), QueryError> {
        let direction = match &self.sort {
            Some(current) if current.column == column => current.direction.reversed(),
            _ => SortDirection::Asc,
        };
        self.set_sort(
            manifest,
            Some(SortSpec {
                column: column.to_string(),
                direction,
            }),
        )
    }

    /// Re-aligns the view with a freshly ingested manifest.
    pub fn reconcile(&mut self, previous: &HeaderManifest, next: &HeaderManifest) {
        if previous != next {
            self.visible_columns = next.default_visible_columns();
        }
        if let Some(spec) = &self.sort {
            if !next.contains(&spec.column) {
                self.sort = None;
            }
        }
        if next.batch_column().is_none() {
            self.batch_filter = BatchFilter::All;
        }
    }
}
