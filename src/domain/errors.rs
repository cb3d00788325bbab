use thiserror::Error;

use crate::domain::entities::attendance::Section;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("source unavailable: {location} ({reason})")]
    SourceUnavailable { location: String, reason: String },

    #[error("source has no rows: {location}")]
    EmptySource { location: String },

    #[error("unsupported file type: {location}")]
    UnsupportedFormat { location: String },
}

impl IngestError {
    pub fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::SourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn empty(location: impl Into<String>) -> Self {
        IngestError::EmptySource {
            location: location.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },
}

impl QueryError {
    pub fn unknown(column: impl Into<String>) -> Self {
        QueryError::UnknownColumn {
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roll {token} is listed in section {first} and section {second}")]
    DuplicateToken {
        token: String,
        first: Section,
        second: Section,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("select at least one section before recording attendance")]
    EmptyActiveSectionSet,

    #[error("the table has no roll number column")]
    MissingRollColumn,

    #[error(transparent)]
    Roster(#[from] RosterError),
}
