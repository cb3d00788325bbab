use crate::domain::entities::dataset::{format_number, Dataset, Record};
use crate::usecase::services::attendance_service::{ABSENT_LABEL, PRESENT_LABEL};

pub const CGPA_COLUMN_KEY: &str = "cgpa";
pub const BACKLOG_COLUMN_KEY: &str = "total backlogs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch: String,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryReport {
    pub totals: Vec<SummaryEntry>,
    pub batch_totals: Vec<BatchSummary>,
    pub notes: Vec<String>,
}

fn entry(label: &str, value: impl Into<String>) -> SummaryEntry {
    SummaryEntry {
        label: label.to_string(),
        value: value.into(),
    }
}

fn format_mean(values: &[f64]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(format!("{mean:.2}"))
}

fn numeric_column(records: &[&Record], column_idx: Option<usize>) -> Vec<f64> {
    let Some(idx) = column_idx else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| record.get(idx).and_then(|value| value.as_number()))
        .collect()
}

fn group_entries(
    records: &[&Record],
    cgpa_idx: Option<usize>,
    backlog_idx: Option<usize>,
) -> Vec<SummaryEntry> {
    let mut entries = vec![entry("Students", records.len().to_string())];
    let cgpa = numeric_column(records, cgpa_idx);
    if let Some(mean) = format_mean(&cgpa) {
        entries.push(entry("Average CGPA", mean));
    }
    if backlog_idx.is_some() {
        let with_backlogs = numeric_column(records, backlog_idx)
            .iter()
            .filter(|count| **count > 0.0)
            .count();
        entries.push(entry("Students with backlogs", with_backlogs.to_string()));
    }
    entries
}

/// Aggregates the full record set, never the filtered view.
pub fn compute_summary_report(dataset: &Dataset, attendance_column: &str) -> SummaryReport {
    let manifest = dataset.manifest();
    let cgpa_idx = manifest.find_key(CGPA_COLUMN_KEY);
    let backlog_idx = manifest.find_key(BACKLOG_COLUMN_KEY);
    let attendance_idx = manifest.position(attendance_column);
    let all: Vec<&Record> = dataset.records().iter().collect();

    let mut report = SummaryReport {
        totals: group_entries(&all, cgpa_idx, backlog_idx),
        ..SummaryReport::default()
    };

    let cgpa = numeric_column(&all, cgpa_idx);
    if cgpa_idx.is_none() {
        report.notes.push("No CGPA column found".to_string());
    } else if let (Some(max), Some(min)) = (
        cgpa.iter().copied().reduce(f64::max),
        cgpa.iter().copied().reduce(f64::min),
    ) {
        report.totals.push(entry("Highest CGPA", format_number(max)));
        report.totals.push(entry("Lowest CGPA", format_number(min)));
    }

    if backlog_idx.is_none() {
        report.notes.push("No backlog column found".to_string());
    } else {
        let total: f64 = numeric_column(&all, backlog_idx).iter().sum();
        report.totals.push(entry("Total backlogs", format_number(total)));
    }

    if let Some(idx) = attendance_idx {
        let count = |label: &str| all.iter().filter(|r| r.text(idx) == label).count();
        report
            .totals
            .push(entry(PRESENT_LABEL, count(PRESENT_LABEL).to_string()));
        report
            .totals
            .push(entry(ABSENT_LABEL, count(ABSENT_LABEL).to_string()));
    }

    if let Some(batch_idx) = manifest.batch_column() {
        for batch in dataset.batch_values() {
            let members: Vec<&Record> = all
                .iter()
                .copied()
                .filter(|record| record.text(batch_idx) == batch)
                .collect();
            report.batch_totals.push(BatchSummary {
                entries: group_entries(&members, cgpa_idx, backlog_idx),
                batch,
            });
        }
    }

    report
}
