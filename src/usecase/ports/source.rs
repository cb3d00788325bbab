use crate::domain::entities::dataset::ColumnValue;
use crate::domain::errors::IngestError;

/// Cells as read from a source, header row split off. Rows may be ragged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ColumnValue>>,
}

pub trait TabularSource {
    /// Human-readable location used in notices and logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<RawTable, IngestError>;
}
