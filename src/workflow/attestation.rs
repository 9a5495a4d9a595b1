use super::error::WorkflowError;
use super::kinds::Stage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An officer's sign-off on one stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attestation {
    pub officer_name: String,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
    /// Opaque reference into the signature store.
    #[serde(default)]
    pub signature_ref: Option<String>,
}

impl Attestation {
    pub fn new(officer_name: impl Into<String>, completed_on: NaiveDate) -> Self {
        Self {
            officer_name: officer_name.into(),
            designation: None,
            department: None,
            completed_on: Some(completed_on),
            signature_ref: None,
        }
    }

    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.designation = Some(designation.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_signature(mut self, signature_ref: impl Into<String>) -> Self {
        self.signature_ref = Some(signature_ref.into());
        self
    }

    pub fn validate(&self, stage: Stage) -> Result<NaiveDate, WorkflowError> {
        if self.officer_name.trim().is_empty() {
            return Err(WorkflowError::IncompleteAttestation {
                stage,
                field: "officer_name",
            });
        }
        self.completed_on
            .ok_or(WorkflowError::IncompleteAttestation {
                stage,
                field: "completed_on",
            })
    }
}

/// Stored state of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub completed: bool,
    pub officer_name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub completed_on: Option<NaiveDate>,
    pub signature_ref: Option<String>,
    pub updated_at: i64,
}
