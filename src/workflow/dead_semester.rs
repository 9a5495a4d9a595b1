use super::engine::{ensure_kind, WorkflowEngine};
use super::error::WorkflowError;
use super::kinds::{ProcessSubject, WorkflowKind};
use super::status::ProcessStatus;
use super::store::{get_or_insert_process, load_header, load_process};
use super::ProcessId;
use crate::shared::{new_record_id, now_secs};
use crate::store::{begin_write, date_from_db, date_to_db, unique_violation};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadPeriod {
    Semester,
    Year,
}

impl DeadPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Semester => "SEMESTER",
            Self::Year => "YEAR",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SEMESTER" => Some(Self::Semester),
            "YEAR" => Some(Self::Year),
            _ => None,
        }
    }

    fn max_target(self) -> u8 {
        match self {
            Self::Semester => 2,
            Self::Year => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeadSemesterRequest {
    pub period: DeadPeriod,
    /// Semester number (1..=2) or year of study (1..=5) being frozen.
    pub target_number: u8,
    pub reason: String,
    pub applied_on: NaiveDate,
}

impl DeadSemesterRequest {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let max = self.period.max_target();
        if !(1..=max).contains(&self.target_number) {
            return Err(WorkflowError::InvalidField {
                field: "target_number",
                reason: format!(
                    "dead {} number must be in range 1..={max}; got {}",
                    self.period.as_str().to_ascii_lowercase(),
                    self.target_number
                ),
            });
        }
        validate_reason(&self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResumptionRequest {
    pub resume_semester: u8,
    pub resume_year: u8,
    pub reason: String,
    pub applied_on: NaiveDate,
}

impl ResumptionRequest {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if !(1..=2).contains(&self.resume_semester) {
            return Err(WorkflowError::InvalidField {
                field: "resume_semester",
                reason: format!("must be in range 1..=2; got {}", self.resume_semester),
            });
        }
        if !(1..=5).contains(&self.resume_year) {
            return Err(WorkflowError::InvalidField {
                field: "resume_year",
                reason: format!("must be in range 1..=5; got {}", self.resume_year),
            });
        }
        validate_reason(&self.reason)
    }
}

fn validate_reason(reason: &str) -> Result<(), WorkflowError> {
    if reason.trim().is_empty() {
        return Err(WorkflowError::InvalidField {
            field: "reason",
            reason: "must be non-empty".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumptionApplication {
    pub id: i64,
    pub dead_semester_process_id: ProcessId,
    pub resume_semester: u8,
    pub resume_year: u8,
    pub reason: String,
    pub applied_on: Option<NaiveDate>,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadSemesterApplication {
    pub process_id: ProcessId,
    pub student_id: String,
    pub period: DeadPeriod,
    pub target_number: u8,
    pub reason: String,
    pub applied_on: Option<NaiveDate>,
    pub status: ProcessStatus,
    pub resumption: Option<ResumptionApplication>,
}

impl DeadSemesterApplication {
    /// HOD, faculty and registrar have all recommended.
    pub fn approved(&self) -> bool {
        self.status == ProcessStatus::Approved
    }
}

impl WorkflowEngine {
    pub fn file_dead_semester_application(
        &self,
        student_id: &str,
        request: &DeadSemesterRequest,
    ) -> Result<ProcessId, WorkflowError> {
        request.validate()?;
        let token = new_record_id().map_err(WorkflowError::IdGeneration)?;

        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM students WHERE id = ?1",
                params![student_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(WorkflowError::sql)?
            .is_some();
        if !exists {
            return Err(WorkflowError::UnknownSubject {
                subject: format!("student `{student_id}`"),
            });
        }

        let (process_id, _) = get_or_insert_process(
            &tx,
            WorkflowKind::DeadSemester,
            &ProcessSubject::DeadSemesterApplication(token),
            student_id,
            None,
            now_secs(),
        )
        .map_err(WorkflowError::sql)?;
        tx.execute(
            "
            INSERT INTO dead_semester_applications (
                process_id, application_type, target_number, reason, applied_on
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                process_id.get(),
                request.period.as_str(),
                request.target_number,
                request.reason.trim(),
                date_to_db(request.applied_on),
            ],
        )
        .map_err(WorkflowError::sql)?;
        tx.commit().map_err(WorkflowError::sql)?;
        Ok(process_id)
    }

    pub fn dead_semester_application(
        &self,
        process_id: ProcessId,
    ) -> Result<DeadSemesterApplication, WorkflowError> {
        let conn = self.connect()?;
        load_dead_semester_application(&conn, process_id)
    }

    pub fn dead_semester_applications(
        &self,
        student_id: &str,
    ) -> Result<Vec<DeadSemesterApplication>, WorkflowError> {
        let conn = self.connect()?;
        dead_semester_process_ids(&conn, student_id)?
            .into_iter()
            .map(|process_id| load_dead_semester_application(&conn, process_id))
            .collect()
    }

    /// Applications still waiting on at least one recommendation.
    pub fn unresolved_dead_semester_applications(
        &self,
        student_id: &str,
    ) -> Result<Vec<ProcessId>, WorkflowError> {
        let conn = self.connect()?;
        let mut unresolved = Vec::new();
        for process_id in dead_semester_process_ids(&conn, student_id)? {
            if !load_process(&conn, process_id)?.status().is_terminal() {
                unresolved.push(process_id);
            }
        }
        Ok(unresolved)
    }

    /// At most one resumption per approved dead-semester application.
    pub fn create_resumption_application(
        &self,
        process_id: ProcessId,
        request: &ResumptionRequest,
    ) -> Result<i64, WorkflowError> {
        request.validate()?;
        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let header = load_header(&tx, process_id)?;
        ensure_kind(header.kind, WorkflowKind::DeadSemester, process_id)?;

        let status = load_process(&tx, process_id)?.status();
        if !status.is_terminal() {
            return Err(WorkflowError::NotApproved { process_id, status });
        }
        if load_resumption(&tx, process_id)?.is_some() {
            return Err(WorkflowError::DuplicateResumption { process_id });
        }

        tx.execute(
            "
            INSERT INTO resumption_applications (
                dead_semester_process_id, resume_semester, resume_year, reason, applied_on
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                process_id.get(),
                request.resume_semester,
                request.resume_year,
                request.reason.trim(),
                date_to_db(request.applied_on),
            ],
        )
        .map_err(|source| match unique_violation(&source) {
            Some(_) => WorkflowError::DuplicateResumption { process_id },
            None => WorkflowError::sql(source),
        })?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(WorkflowError::sql)?;

        self.log().info(
            "workflow.resumption_created",
            &[
                ("process_id", Value::from(process_id.get())),
                ("resumption_id", Value::from(id)),
                ("student_id", Value::from(header.student_id)),
            ],
        );
        Ok(id)
    }

    pub fn approve_resumption(&self, resumption_id: i64) -> Result<(), WorkflowError> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE resumption_applications SET approved = 1 WHERE id = ?1",
                params![resumption_id],
            )
            .map_err(WorkflowError::sql)?;
        if updated == 0 {
            return Err(WorkflowError::UnknownResumption { id: resumption_id });
        }
        Ok(())
    }

    pub fn resumption_for(
        &self,
        process_id: ProcessId,
    ) -> Result<Option<ResumptionApplication>, WorkflowError> {
        let conn = self.connect()?;
        load_resumption(&conn, process_id)
    }
}

fn dead_semester_process_ids(
    conn: &Connection,
    student_id: &str,
) -> Result<Vec<ProcessId>, WorkflowError> {
    let mut statement = conn
        .prepare(
            "
            SELECT id FROM approval_processes
            WHERE student_id = ?1 AND kind = ?2
            ORDER BY id ASC
            ",
        )
        .map_err(WorkflowError::sql)?;
    let rows = statement
        .query_map(
            params![student_id, WorkflowKind::DeadSemester.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .map_err(WorkflowError::sql)?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(ProcessId(row.map_err(WorkflowError::sql)?));
    }
    Ok(ids)
}

fn load_dead_semester_application(
    conn: &Connection,
    process_id: ProcessId,
) -> Result<DeadSemesterApplication, WorkflowError> {
    let process = load_process(conn, process_id)?;
    ensure_kind(process.kind, WorkflowKind::DeadSemester, process_id)?;

    let (period_raw, target_number, reason, applied_on) = conn
        .query_row(
            "
            SELECT application_type, target_number, reason, applied_on
            FROM dead_semester_applications
            WHERE process_id = ?1
            ",
            params![process_id.get()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u8>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .map_err(WorkflowError::sql)?;
    let period = DeadPeriod::parse(&period_raw).ok_or(WorkflowError::CorruptRecord {
        what: "dead semester application type",
        value: period_raw,
    })?;

    Ok(DeadSemesterApplication {
        process_id,
        status: process.status(),
        student_id: process.student_id,
        period,
        target_number,
        reason,
        applied_on: date_from_db(&applied_on),
        resumption: load_resumption(conn, process_id)?,
    })
}

fn load_resumption(
    conn: &Connection,
    process_id: ProcessId,
) -> Result<Option<ResumptionApplication>, WorkflowError> {
    conn.query_row(
        "
        SELECT id, resume_semester, resume_year, reason, applied_on, approved
        FROM resumption_applications
        WHERE dead_semester_process_id = ?1
        ",
        params![process_id.get()],
        |row| {
            Ok(ResumptionApplication {
                id: row.get(0)?,
                dead_semester_process_id: process_id,
                resume_semester: row.get(1)?,
                resume_year: row.get(2)?,
                reason: row.get(3)?,
                applied_on: date_from_db(&row.get::<_, String>(4)?),
                approved: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(WorkflowError::sql)
}
