//! Student identity and per-semester Access Numbers.
//!
//! The last issued sequence code is the single piece of global mutable
//! state. Anything that may allocate runs under [`Registry::with_write_lock`],
//! an IMMEDIATE transaction that takes SQLite's write lock before the
//! counter is read.

pub mod access_numbers;
pub mod catalog;
pub mod error;
pub mod records;
pub mod sequence;
pub mod students;

pub use access_numbers::{AccessNumberRequest, BulkIssueOutcome, SemesterIdentifier};
pub use catalog::{AcademicYear, Course, Program, Semester};
pub use error::RegistryError;
pub use records::{
    AssociationStatus, CourseUnitStatus, CourseWorkStatus, Internship, InternshipStatus,
    StudentAssociation, StudentCourseUnit, StudentCourseWork,
};
pub use students::{NewStudent, Session, StudentRecord};

use crate::config::{AllocationConfig, Settings};
use crate::shared::EventLog;
use crate::store::Database;
use rusqlite::{Transaction, TransactionBehavior};
use serde_json::Value;
use std::thread;

#[derive(Debug, Clone)]
pub struct Registry {
    db: Database,
    allocation: AllocationConfig,
    log: EventLog,
}

impl Registry {
    pub fn open(settings: &Settings) -> Result<Self, RegistryError> {
        let db = Database::open(&settings.database_path, settings.allocation.busy_timeout())?;
        Ok(Self::new(
            db,
            settings.allocation.clone(),
            EventLog::from_optional(settings.log_path.as_deref()),
        ))
    }

    pub fn new(db: Database, allocation: AllocationConfig, log: EventLog) -> Self {
        Self {
            db,
            allocation,
            log,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs `body` inside an IMMEDIATE transaction, retrying with backoff
    /// while another writer holds the lock. `body` may run more than once.
    pub(crate) fn with_write_lock<T, F>(&self, mut body: F) -> Result<T, RegistryError>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T, RegistryError>,
    {
        let mut attempt = 1;
        loop {
            match self.try_write_lock(&mut body) {
                Err(err) if err.is_conflict() => {
                    if attempt >= self.allocation.max_attempts {
                        return Err(RegistryError::ConcurrencyConflict { attempts: attempt });
                    }
                    self.log.info(
                        "sequence.conflict_retry",
                        &[
                            ("attempt", Value::from(attempt)),
                            ("error", Value::from(err.to_string())),
                        ],
                    );
                    thread::sleep(self.allocation.backoff_for(attempt));
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn try_write_lock<T, F>(&self, body: &mut F) -> Result<T, RegistryError>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T, RegistryError>,
    {
        let mut conn = self.db.connect()?;
        let mut tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RegistryError::sql)?;
        let value = body(&mut tx)?;
        tx.commit().map_err(RegistryError::sql)?;
        Ok(value)
    }
}
