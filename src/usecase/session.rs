use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::domain::entities::attendance::{
    ActiveSectionSet, AttendanceReport, InputMeaning, Section,
};
use crate::domain::entities::dataset::{HeaderManifest, StoreVersion};
use crate::domain::entities::view::{BatchFilter, RowLimit, ViewState};
use crate::domain::errors::{AttendanceError, QueryError};
use crate::domain::roster::SectionRoster;
use crate::usecase::ports::repo::RecordRepository;
use crate::usecase::services::attendance_service::{merge_marks, AttendanceResolver};
use crate::usecase::services::import_service::{ImportResult, ImportService, LoadedDataset};
use crate::usecase::services::query_service::{QueryService, TableView};
use crate::usecase::services::summary_service::{compute_summary_report, SummaryReport};

/// All dashboard state the engine cares about. UI code holds one of these
/// and calls into it; nothing here re-renders on its own.
pub struct DashboardSession {
    repo: Arc<dyn RecordRepository>,
    import: ImportService,
    query: QueryService,
    resolver: AttendanceResolver<'static>,
    attendance_column: String,
    view: ViewState,
    active_sections: ActiveSectionSet,
    last_report: Option<AttendanceReport>,
}

impl DashboardSession {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        roster: &'static SectionRoster,
        config: &AppConfig,
    ) -> Self {
        Self {
            import: ImportService::new(repo.clone()),
            query: QueryService::new(repo.clone()),
            resolver: AttendanceResolver::new(roster, config.input_meaning),
            attendance_column: config.attendance_column.clone(),
            repo,
            view: ViewState::default(),
            active_sections: ActiveSectionSet::new(),
            last_report: None,
        }
    }

    pub fn version(&self) -> StoreVersion {
        self.repo.snapshot().version
    }

    pub fn has_data(&self) -> bool {
        !self.repo.snapshot().dataset.is_empty()
    }

    pub fn manifest(&self) -> HeaderManifest {
        self.repo.snapshot().dataset.manifest().clone()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn batch_options(&self) -> Vec<String> {
        self.repo.snapshot().dataset.batch_values()
    }

    fn after_replace(&mut self, previous: &HeaderManifest) {
        let next = self.manifest();
        self.view.reconcile(previous, &next);
    }

    /// Commits a dataset loaded elsewhere, then re-aligns the view.
    pub fn commit_loaded(&mut self, loaded: LoadedDataset) -> ImportResult {
        let previous = self.manifest();
        let result = self.import.commit(loaded);
        self.after_replace(&previous);
        result
    }

    #[cfg(test)]
    pub fn ingest_path(
        &mut self,
        path: &std::path::Path,
    ) -> Result<ImportResult, crate::domain::errors::IngestError> {
        let loaded = crate::usecase::services::import_service::load_path(path)?;
        Ok(self.commit_loaded(loaded))
    }

    pub fn table(&self) -> Result<Arc<TableView>, QueryError> {
        self.query.table(&self.view)
    }

    pub fn toggle_column(&mut self, column: &str) -> Result<(), QueryError> {
        let manifest = self.manifest();
        self.view.toggle_column(&manifest, column)
    }

    pub fn sort_by_column(&mut self, column: &str) -> Result<(), QueryError> {
        let manifest = self.manifest();
        self.view.sort_by_column(&manifest, column)
    }

    pub fn clear_sort(&mut self) {
        let manifest = self.manifest();
        if let Err(err) = self.view.set_sort(&manifest, None) {
            warn!("clearing sort failed: {err}");
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.view.set_search_query(query);
    }

    pub fn set_batch_filter(&mut self, filter: BatchFilter) -> Result<(), QueryError> {
        let manifest = self.manifest();
        self.view.set_batch_filter(&manifest, filter)
    }

    pub fn set_row_limit(&mut self, limit: RowLimit) {
        self.view.set_row_limit(limit);
    }

    pub fn active_sections(&self) -> &ActiveSectionSet {
        &self.active_sections
    }

    pub fn toggle_section(&mut self, section: Section) {
        if !self.active_sections.remove(&section) {
            self.active_sections.insert(section);
        }
    }

    pub fn input_meaning(&self) -> InputMeaning {
        self.resolver.meaning()
    }

    pub fn set_input_meaning(&mut self, meaning: InputMeaning) {
        self.resolver.set_meaning(meaning);
    }

    pub fn resolve_attendance(&mut self, input: &str) -> Result<&AttendanceReport, AttendanceError> {
        let report = self.resolver.resolve(input, &self.active_sections)?;
        let report = self.last_report.insert(report);
        Ok(&*report)
    }

    pub fn last_report(&self) -> Option<&AttendanceReport> {
        self.last_report.as_ref()
    }

    pub fn attendance_column(&self) -> &str {
        &self.attendance_column
    }

    /// Folds the last resolution into the record store as a column. Returns
    /// `Ok(None)` when nothing has been resolved yet.
    pub fn merge_last_report(&mut self) -> Result<Option<StoreVersion>, AttendanceError> {
        let Some(report) = self.last_report.as_ref() else {
            return Ok(None);
        };
        let snapshot = self.repo.snapshot();
        let merged = merge_marks(&snapshot.dataset, report, &self.attendance_column)?;
        let version = self.repo.replace(merged);
        let next = self.manifest();
        if let Err(err) = self
            .view
            .set_column_visible(&next, &self.attendance_column, true)
        {
            warn!("showing attendance column failed: {err}");
        }
        Ok(Some(version))
    }

    pub fn summary(&self) -> SummaryReport {
        compute_summary_report(&self.query.full_dataset(), &self.attendance_column)
    }
}
