use std::fmt;

pub const BATCH_COLUMN_KEY: &str = "batch";
pub const ROLL_COLUMN_KEY: &str = "rollno";
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Column keys shown by default after an ingestion. Matching happens on
/// [`column_key`], so `"Total\r\nCredits"` matches `"total credits"`.
pub const DEFAULT_VISIBLE_KEYS: [&str; 9] = [
    "batch",
    "sno",
    "batch-wise sno",
    "rollno",
    "name",
    "cgpa",
    "total credits",
    "total backlogs",
    "%",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StoreVersion(pub u64);

impl StoreVersion {
    pub fn next(self) -> Self {
        StoreVersion(self.0 + 1)
    }
}

impl From<u64> for StoreVersion {
    fn from(value: u64) -> Self {
        StoreVersion(value)
    }
}

impl From<StoreVersion> for u64 {
    fn from(value: StoreVersion) -> Self {
        value.0
    }
}

/// Normalized form of a raw header, used only for allow-list matching.
pub fn column_key(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract().abs() < f64::EPSILON && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{value:.6}");
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Number { value: f64, raw: String },
}

impl ColumnValue {
    /// Resolves a textual cell, keeping the source text for display.
    pub fn from_cell(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && !raw.trim().is_empty() => {
                ColumnValue::Number { value, raw }
            }
            _ => ColumnValue::Text(raw),
        }
    }

    pub fn number(value: f64) -> Self {
        ColumnValue::Number {
            value,
            raw: format_number(value),
        }
    }

    pub fn empty() -> Self {
        ColumnValue::Text(String::new())
    }

    pub fn as_text(&self) -> &str {
        match self {
            ColumnValue::Text(text) => text,
            ColumnValue::Number { raw, .. } => raw,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ColumnValue::Number { value, .. } => Some(*value),
            ColumnValue::Text(_) => None,
        }
    }
}

impl Default for ColumnValue {
    fn default() -> Self {
        ColumnValue::empty()
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Column names in source order. Names are unique; display always uses them
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderManifest {
    columns: Vec<String>,
}

impl HeaderManifest {
    /// Builds a manifest from raw header cells, naming blank headers
    /// `__EMPTY` and suffixing repeats with `_1`, `_2`, ...
    pub fn from_raw<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns: Vec<String> = Vec::new();
        for header in headers {
            let header = header.as_ref();
            let base = if header.trim().is_empty() {
                EMPTY_HEADER.to_string()
            } else {
                header.to_string()
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while columns.iter().any(|existing| existing == &candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            columns.push(candidate);
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// First column whose [`column_key`] equals `key`.
    pub fn find_key(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|name| column_key(name) == key)
    }

    pub fn batch_column(&self) -> Option<usize> {
        self.find_key(BATCH_COLUMN_KEY)
    }

    pub fn roll_column(&self) -> Option<usize> {
        self.find_key(ROLL_COLUMN_KEY)
    }

    /// Allow-listed columns in manifest order.
    pub fn default_visible_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| DEFAULT_VISIBLE_KEYS.contains(&column_key(name).as_str()))
            .cloned()
            .collect()
    }

    pub(crate) fn push(&mut self, column: String) -> usize {
        self.columns.push(column);
        self.columns.len() - 1
    }
}

/// One row; `values[i]` belongs to `manifest.columns()[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<ColumnValue>,
}

impl Record {
    pub fn new(values: Vec<ColumnValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, column_idx: usize) -> Option<&ColumnValue> {
        self.values.get(column_idx)
    }

    pub fn text(&self, column_idx: usize) -> &str {
        self.get(column_idx).map(ColumnValue::as_text).unwrap_or("")
    }

    #[cfg(test)]
    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    pub(crate) fn set(&mut self, column_idx: usize, value: ColumnValue) {
        if self.values.len() <= column_idx {
            self.values.resize(column_idx + 1, ColumnValue::empty());
        }
        self.values[column_idx] = value;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    manifest: HeaderManifest,
    records: Vec<Record>,
}

impl Dataset {
    /// Pads or widens every record so it carries one value per column.
    pub fn new(mut manifest: HeaderManifest, mut records: Vec<Record>) -> Self {
        let width = records
            .iter()
            .map(|record| record.values.len())
            .max()
            .unwrap_or(0);
        if manifest.len() < width {
            let missing = width - manifest.len();
            manifest = HeaderManifest::from_raw(
                manifest
                    .columns()
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::repeat("").take(missing)),
            );
        }
        for record in &mut records {
            record.values.resize(manifest.len(), ColumnValue::empty());
        }
        Self { manifest, records }
    }

    pub fn manifest(&self) -> &HeaderManifest {
        &self.manifest
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn value(&self, row_idx: usize, column: &str) -> Option<&ColumnValue> {
        let column_idx = self.manifest.position(column)?;
        self.records.get(row_idx)?.get(column_idx)
    }

    /// Distinct batch values in first-seen order.
    pub fn batch_values(&self) -> Vec<String> {
        let Some(batch_idx) = self.manifest.batch_column() else {
            return Vec::new();
        };
        let mut values: Vec<String> = Vec::new();
        for record in &self.records {
            let value = record.text(batch_idx);
            if !value.is_empty() && !values.iter().any(|seen| seen == value) {
                values.push(value.to_string());
            }
        }
        values
    }

    /// Writes `values[row]` into `column`, appending the column when it does
    /// not exist yet.
    pub fn with_column(&self, column: &str, mut values: Vec<ColumnValue>) -> Dataset {
        let mut next = self.clone();
        let column_idx = match next.manifest.position(column) {
            Some(idx) => idx,
            None => next.manifest.push(column.to_string()),
        };
        values.resize(next.records.len(), ColumnValue::empty());
        for (record, value) in next.records.iter_mut().zip(values) {
            record.set(column_idx, value);
        }
        for record in &mut next.records {
            record.values.resize(next.manifest.len(), ColumnValue::empty());
        }
        next
    }
}
