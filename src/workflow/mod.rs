//! Multi-party approval processes.
//!
//! A process is a fixed set of stages, each signed off by one officer. The
//! aggregate status is a fold over the stage flags (plus the requirements
//! gate for graduation) and is recomputed on every read.

pub mod attestation;
pub mod dead_semester;
pub mod engine;
pub mod error;
pub mod graduation;
pub mod kinds;
pub mod status;
pub(crate) mod store;

pub use attestation::{Attestation, StageRecord};
pub use dead_semester::{
    DeadPeriod, DeadSemesterApplication, DeadSemesterRequest, ResumptionApplication,
    ResumptionRequest,
};
pub use engine::WorkflowEngine;
pub use error::WorkflowError;
pub use graduation::{Blocker, BlockerSource, RegistryBlockerSource};
pub use kinds::{ChecklistItem, ProcessSubject, Stage, WorkflowKind};
pub use status::ProcessStatus;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProcessId(pub i64);

impl ProcessId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| format!("process id must be an integer; got `{raw}`"))
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A process with its stages as currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalProcess {
    pub id: ProcessId,
    pub kind: WorkflowKind,
    pub subject: ProcessSubject,
    pub student_id: String,
    pub access_number: Option<String>,
    /// `Some` only for graduation processes.
    pub requirements_met: Option<bool>,
    pub stages: Vec<StageRecord>,
    pub created_at: i64,
}

impl ApprovalProcess {
    pub fn status(&self) -> ProcessStatus {
        ProcessStatus::fold(
            self.stages
                .iter()
                .map(|record| record.completed)
                .chain(self.requirements_met),
        )
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|record| record.stage == stage)
    }
}
