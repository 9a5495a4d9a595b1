use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub fn sql(source: rusqlite::Error) -> Self {
        Self::Sql { source }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            Self::Sql { source } | Self::Open { source, .. } => is_busy(source),
            Self::CreateParent { .. } => false,
        }
    }
}

/// Another connection holds the write lock.
pub fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Returns the violated column list (`students.registration_number`) when
/// `err` is a UNIQUE or PRIMARY KEY violation.
pub fn unique_violation(err: &rusqlite::Error) -> Option<String> {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return None;
    };
    let is_unique = failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY;
    if !is_unique {
        return None;
    }
    let columns = message
        .as_deref()
        .and_then(|text| text.split_once("failed: "))
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| "unique constraint".to_string());
    Some(columns)
}
