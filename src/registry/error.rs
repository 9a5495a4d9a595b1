use crate::allocator::{FormatError, SequenceError};
use crate::store::{unique_violation, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("sequence allocation conflicted with concurrent writers after {attempts} attempt(s)")]
    ConcurrencyConflict { attempts: u32 },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("stored sequence code `{value}` is corrupt: {source}")]
    MalformedStoredCode {
        value: String,
        #[source]
        source: SequenceError,
    },
    #[error("duplicate identifier: {what}")]
    DuplicateIdentifier { what: String },
    #[error("student `{student_id}` not found")]
    UnknownStudent { student_id: String },
    #[error("program `{program}` not found")]
    UnknownProgram { program: String },
    #[error("academic year `{id}` not found")]
    UnknownAcademicYear { id: i64 },
    #[error("semester `{id}` not found")]
    UnknownSemester { id: i64 },
    #[error("access number `{code}` not found")]
    UnknownAccessNumber { code: String },
    #[error("{what} `{id}` not found")]
    UnknownRecord { what: &'static str, id: i64 },
    #[error("semester `{semester_id}` does not belong to academic year `{academic_year_id}`")]
    SemesterYearMismatch {
        semester_id: i64,
        academic_year_id: i64,
    },
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to generate record id: {0}")]
    IdGeneration(String),
    #[error("stored {what} `{value}` is not recognised")]
    CorruptRecord { what: &'static str, value: String },
}

impl RegistryError {
    pub(crate) fn sql(source: rusqlite::Error) -> Self {
        Self::Store(StoreError::sql(source))
    }

    /// Maps unique-constraint failures on writes to `DuplicateIdentifier`.
    pub(crate) fn from_write(source: rusqlite::Error) -> Self {
        match unique_violation(&source) {
            Some(what) => Self::DuplicateIdentifier { what },
            None => Self::sql(source),
        }
    }

    /// The write lock could not be taken; retrying may succeed.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Store(err) => err.is_busy(),
            Self::ConcurrencyConflict { .. } => true,
            _ => false,
        }
    }
}
