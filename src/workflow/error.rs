use super::graduation::Blocker;
use super::kinds::{Stage, WorkflowKind};
use super::status::ProcessStatus;
use super::ProcessId;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("approval process `{process_id}` not found")]
    UnknownProcess { process_id: ProcessId },
    #[error("stage `{stage}` is not defined for {kind} processes")]
    UnknownStage { kind: WorkflowKind, stage: String },
    #[error("attestation for stage `{stage}` is missing `{field}`")]
    IncompleteAttestation { stage: Stage, field: &'static str },
    #[error("process `{process_id}` is a {actual} process; expected {expected}")]
    WrongKind {
        process_id: ProcessId,
        expected: WorkflowKind,
        actual: WorkflowKind,
    },
    #[error("process `{process_id}` is {status}; all recommendations are required")]
    NotApproved {
        process_id: ProcessId,
        status: ProcessStatus,
    },
    #[error("process `{process_id}` already has a resumption application")]
    DuplicateResumption { process_id: ProcessId },
    #[error("process `{process_id}` is approved and can no longer be changed")]
    ProcessFinalized { process_id: ProcessId },
    #[error("checklist item `{item}` is not defined")]
    UnknownChecklistItem { item: String },
    #[error("student `{student_id}` has {} outstanding graduation requirement(s)", .blockers.len())]
    OutstandingBlockers {
        student_id: String,
        blockers: Vec<Blocker>,
    },
    #[error("{subject} not found")]
    UnknownSubject { subject: String },
    #[error("resumption application `{id}` not found")]
    UnknownResumption { id: i64 },
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to generate record id: {0}")]
    IdGeneration(String),
    #[error("stored {what} `{value}` is not recognised")]
    CorruptRecord { what: &'static str, value: String },
}

impl WorkflowError {
    pub(crate) fn sql(source: rusqlite::Error) -> Self {
        Self::Store(StoreError::sql(source))
    }
}
