use super::attestation::StageRecord;
use super::error::WorkflowError;
use super::kinds::{ProcessSubject, Stage, WorkflowKind};
use super::{ApprovalProcess, ProcessId};
use crate::store::date_from_db;
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone)]
pub(crate) struct ProcessHeader {
    pub id: ProcessId,
    pub kind: WorkflowKind,
    pub subject: ProcessSubject,
    pub student_id: String,
    pub access_number: Option<String>,
    pub requirements_met: Option<bool>,
    pub created_at: i64,
}

/// Inserts the process and one pending row per required stage, or returns
/// the existing process for the same subject. The flag is `true` when a
/// new process was created.
pub(crate) fn get_or_insert_process(
    conn: &Connection,
    kind: WorkflowKind,
    subject: &ProcessSubject,
    student_id: &str,
    access_number: Option<&str>,
    now: i64,
) -> rusqlite::Result<(ProcessId, bool)> {
    let requirements_met = kind.has_requirements_gate().then_some(0i64);
    let inserted = conn.execute(
        "
        INSERT INTO approval_processes (
            kind, subject_kind, subject_ref, student_id, access_number,
            requirements_met, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(kind, subject_kind, subject_ref) DO NOTHING
        ",
        params![
            kind.as_str(),
            subject.kind_str(),
            subject.ref_string(),
            student_id,
            access_number,
            requirements_met,
            now,
        ],
    )?;

    if inserted == 0 {
        let existing: i64 = conn.query_row(
            "
            SELECT id FROM approval_processes
            WHERE kind = ?1 AND subject_kind = ?2 AND subject_ref = ?3
            ",
            params![kind.as_str(), subject.kind_str(), subject.ref_string()],
            |row| row.get(0),
        )?;
        return Ok((ProcessId(existing), false));
    }

    let id = conn.last_insert_rowid();
    for stage in kind.required_stages() {
        conn.execute(
            "
            INSERT INTO approval_stages (process_id, stage, completed, updated_at)
            VALUES (?1, ?2, 0, ?3)
            ",
            params![id, stage.as_str(), now],
        )?;
    }
    Ok((ProcessId(id), true))
}

pub(crate) fn find_process_id(
    conn: &Connection,
    kind: WorkflowKind,
    subject: &ProcessSubject,
) -> Result<Option<ProcessId>, WorkflowError> {
    conn.query_row(
        "
        SELECT id FROM approval_processes
        WHERE kind = ?1 AND subject_kind = ?2 AND subject_ref = ?3
        ",
        params![kind.as_str(), subject.kind_str(), subject.ref_string()],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map(|found| found.map(ProcessId))
    .map_err(WorkflowError::sql)
}

pub(crate) fn load_header(
    conn: &Connection,
    process_id: ProcessId,
) -> Result<ProcessHeader, WorkflowError> {
    let row = conn
        .query_row(
            "
            SELECT kind, subject_kind, subject_ref, student_id, access_number,
                   requirements_met, created_at
            FROM approval_processes
            WHERE id = ?1
            ",
            params![process_id.get()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()
        .map_err(WorkflowError::sql)?
        .ok_or(WorkflowError::UnknownProcess { process_id })?;

    let (kind_raw, subject_kind, subject_ref, student_id, access_number, gate, created_at) = row;
    let kind = WorkflowKind::parse(&kind_raw).ok_or(WorkflowError::CorruptRecord {
        what: "workflow kind",
        value: kind_raw,
    })?;
    let subject = ProcessSubject::from_db(&subject_kind, &subject_ref).ok_or_else(|| {
        WorkflowError::CorruptRecord {
            what: "process subject",
            value: format!("{subject_kind}:{subject_ref}"),
        }
    })?;

    Ok(ProcessHeader {
        id: process_id,
        kind,
        subject,
        student_id,
        access_number,
        requirements_met: gate.map(|value| value != 0),
        created_at,
    })
}

pub(crate) fn load_stages(
    conn: &Connection,
    header: &ProcessHeader,
) -> Result<Vec<StageRecord>, WorkflowError> {
    let mut statement = conn
        .prepare(
            "
            SELECT stage, completed, officer_name, officer_designation,
                   officer_department, completed_on, signature_ref, updated_at
            FROM approval_stages
            WHERE process_id = ?1
            ",
        )
        .map_err(WorkflowError::sql)?;
    let rows = statement
        .query_map(params![header.id.get()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })
        .map_err(WorkflowError::sql)?;

    let mut stages = Vec::new();
    for row in rows {
        let (
            stage_raw,
            completed,
            officer_name,
            designation,
            department,
            completed_on,
            signature_ref,
            updated_at,
        ) = row.map_err(WorkflowError::sql)?;
        let stage = Stage::parse(&stage_raw).ok_or(WorkflowError::CorruptRecord {
            what: "stage",
            value: stage_raw,
        })?;
        stages.push(StageRecord {
            stage,
            completed: completed != 0,
            officer_name,
            designation,
            department,
            completed_on: completed_on.as_deref().and_then(date_from_db),
            signature_ref,
            updated_at,
        });
    }

    let order = header.kind.required_stages();
    stages.sort_by_key(|record| {
        order
            .iter()
            .position(|stage| *stage == record.stage)
            .unwrap_or(order.len())
    });
    Ok(stages)
}

pub(crate) fn load_process(
    conn: &Connection,
    process_id: ProcessId,
) -> Result<ApprovalProcess, WorkflowError> {
    let header = load_header(conn, process_id)?;
    let stages = load_stages(conn, &header)?;
    Ok(ApprovalProcess {
        id: header.id,
        kind: header.kind,
        subject: header.subject,
        student_id: header.student_id,
        access_number: header.access_number,
        requirements_met: header.requirements_met,
        stages,
        created_at: header.created_at,
    })
}
