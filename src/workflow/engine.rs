use super::attestation::Attestation;
use super::error::WorkflowError;
use super::kinds::{ChecklistItem, ProcessSubject, WorkflowKind};
use super::status::ProcessStatus;
use super::store::{find_process_id, get_or_insert_process, load_header, load_process};
use super::{ApprovalProcess, ProcessId};
use crate::config::Settings;
use crate::shared::{now_secs, EventLog};
use crate::store::{begin_write, date_to_db, Database};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tracks stage completion for approval processes. Status is always
/// recomputed from stage rows; it is never stored.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    db: Database,
    log: EventLog,
}

impl WorkflowEngine {
    pub fn open(settings: &Settings) -> Result<Self, WorkflowError> {
        let db = Database::open(&settings.database_path, settings.allocation.busy_timeout())?;
        Ok(Self::new(
            db,
            EventLog::from_optional(settings.log_path.as_deref()),
        ))
    }

    pub fn new(db: Database, log: EventLog) -> Self {
        Self { db, log }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn log(&self) -> &EventLog {
        &self.log
    }

    pub(crate) fn connect(&self) -> Result<Connection, WorkflowError> {
        Ok(self.db.connect()?)
    }

    pub fn open_registration(&self, access_number: &str) -> Result<ProcessId, WorkflowError> {
        self.open_for_access_number(WorkflowKind::Registration, access_number)
    }

    pub fn open_semester_clearance(&self, access_number: &str) -> Result<ProcessId, WorkflowError> {
        self.open_for_access_number(WorkflowKind::SemesterClearance, access_number)
    }

    pub fn open_graduation(&self, student_id: &str) -> Result<ProcessId, WorkflowError> {
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
        let (id, _) = get_or_insert_process(
            &tx,
            WorkflowKind::Graduation,
            &ProcessSubject::Student(student_id.to_string()),
            student_id,
            None,
            now_secs(),
        )
        .map_err(WorkflowError::sql)?;
        tx.commit().map_err(WorkflowError::sql)?;
        Ok(id)
    }

    /// Opens a semester clearance for every Access Number issued in the
    /// semester. Returns how many processes were newly created.
    pub fn open_semester_clearances_for_semester(
        &self,
        semester_id: i64,
    ) -> Result<usize, WorkflowError> {
        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let semester_exists = tx
            .query_row(
                "SELECT 1 FROM semesters WHERE id = ?1",
                params![semester_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(WorkflowError::sql)?
            .is_some();
        if !semester_exists {
            return Err(WorkflowError::UnknownSubject {
                subject: format!("semester `{semester_id}`"),
            });
        }

        let access_numbers = {
            let mut statement = tx
                .prepare(
                    "
                    SELECT code, student_id FROM access_numbers
                    WHERE semester_id = ?1
                    ORDER BY code ASC
                    ",
                )
                .map_err(WorkflowError::sql)?;
            let rows = statement
                .query_map(params![semester_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(WorkflowError::sql)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(WorkflowError::sql)?);
            }
            out
        };

        let now = now_secs();
        let mut created = 0;
        for (code, student_id) in &access_numbers {
            let (_, inserted) = get_or_insert_process(
                &tx,
                WorkflowKind::SemesterClearance,
                &ProcessSubject::AccessNumber(code.clone()),
                student_id,
                Some(code),
                now,
            )
            .map_err(WorkflowError::sql)?;
            if inserted {
                created += 1;
            }
        }
        tx.commit().map_err(WorkflowError::sql)?;
        Ok(created)
    }

    pub fn find_process(
        &self,
        kind: WorkflowKind,
        subject: &ProcessSubject,
    ) -> Result<Option<ProcessId>, WorkflowError> {
        let conn = self.connect()?;
        find_process_id(&conn, kind, subject)
    }

    pub fn process(&self, process_id: ProcessId) -> Result<ApprovalProcess, WorkflowError> {
        let conn = self.connect()?;
        load_process(&conn, process_id)
    }

    pub fn get_status(&self, process_id: ProcessId) -> Result<ProcessStatus, WorkflowError> {
        Ok(self.process(process_id)?.status())
    }

    pub fn processes_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<ApprovalProcess>, WorkflowError> {
        let conn = self.connect()?;
        let ids = {
            let mut statement = conn
                .prepare("SELECT id FROM approval_processes WHERE student_id = ?1 ORDER BY id ASC")
                .map_err(WorkflowError::sql)?;
            let rows = statement
                .query_map(params![student_id], |row| row.get::<_, i64>(0))
                .map_err(WorkflowError::sql)?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(ProcessId(row.map_err(WorkflowError::sql)?));
            }
            ids
        };
        ids.into_iter()
            .map(|id| load_process(&conn, id))
            .collect()
    }

    /// Records an attestation on one stage and marks it completed. Calling it
    /// again on a completed stage overwrites the officer details.
    pub fn set_stage_completion(
        &self,
        process_id: ProcessId,
        stage_name: &str,
        attestation: &Attestation,
    ) -> Result<ProcessStatus, WorkflowError> {
        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let header = load_header(&tx, process_id)?;
        let stage = header.kind.stage_named(stage_name)?;
        let completed_on = attestation.validate(stage)?;

        tx.execute(
            "
            UPDATE approval_stages SET
                completed = 1,
                officer_name = ?3,
                officer_designation = ?4,
                officer_department = ?5,
                completed_on = ?6,
                signature_ref = ?7,
                updated_at = ?8
            WHERE process_id = ?1 AND stage = ?2
            ",
            params![
                process_id.get(),
                stage.as_str(),
                attestation.officer_name.trim(),
                attestation.designation,
                attestation.department,
                date_to_db(completed_on),
                attestation.signature_ref,
                now_secs(),
            ],
        )
        .map_err(WorkflowError::sql)?;

        let status = load_process(&tx, process_id)?.status();
        tx.commit().map_err(WorkflowError::sql)?;

        self.log.info(
            "workflow.stage_completed",
            &[
                ("process_id", Value::from(process_id.get())),
                ("kind", Value::from(header.kind.as_str())),
                ("stage", Value::from(stage.as_str())),
                ("officer", Value::from(attestation.officer_name.trim())),
                ("status", Value::from(status.as_str())),
            ],
        );
        Ok(status)
    }

    /// Clears a stage's attestation. Approved processes are final.
    pub fn revoke_stage(
        &self,
        process_id: ProcessId,
        stage_name: &str,
    ) -> Result<ProcessStatus, WorkflowError> {
        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let header = load_header(&tx, process_id)?;
        let stage = header.kind.stage_named(stage_name)?;
        if load_process(&tx, process_id)?.status().is_terminal() {
            return Err(WorkflowError::ProcessFinalized { process_id });
        }

        tx.execute(
            "
            UPDATE approval_stages SET
                completed = 0,
                officer_name = NULL,
                officer_designation = NULL,
                officer_department = NULL,
                completed_on = NULL,
                signature_ref = NULL,
                updated_at = ?3
            WHERE process_id = ?1 AND stage = ?2
            ",
            params![process_id.get(), stage.as_str(), now_secs()],
        )
        .map_err(WorkflowError::sql)?;

        let status = load_process(&tx, process_id)?.status();
        tx.commit().map_err(WorkflowError::sql)?;

        self.log.info(
            "workflow.stage_revoked",
            &[
                ("process_id", Value::from(process_id.get())),
                ("stage", Value::from(stage.as_str())),
                ("status", Value::from(status.as_str())),
            ],
        );
        Ok(status)
    }

    pub fn set_checklist_item(
        &self,
        process_id: ProcessId,
        item_name: &str,
        received: bool,
    ) -> Result<(), WorkflowError> {
        let item = ChecklistItem::parse(item_name.trim()).ok_or_else(|| {
            WorkflowError::UnknownChecklistItem {
                item: item_name.to_string(),
            }
        })?;
        let conn = self.connect()?;
        let header = load_header(&conn, process_id)?;
        ensure_kind(header.kind, WorkflowKind::Registration, process_id)?;

        conn.execute(
            "
            INSERT INTO checklist_items (process_id, item, received, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(process_id, item) DO UPDATE SET
                received = excluded.received,
                updated_at = excluded.updated_at
            ",
            params![process_id.get(), item.as_str(), received, now_secs()],
        )
        .map_err(WorkflowError::sql)?;
        Ok(())
    }

    /// Every orientation and assimilation item with its received flag.
    pub fn checklist(
        &self,
        process_id: ProcessId,
    ) -> Result<BTreeMap<ChecklistItem, bool>, WorkflowError> {
        let conn = self.connect()?;
        let header = load_header(&conn, process_id)?;
        ensure_kind(header.kind, WorkflowKind::Registration, process_id)?;

        let mut items: BTreeMap<ChecklistItem, bool> = ChecklistItem::ALL
            .into_iter()
            .map(|item| (item, false))
            .collect();
        let mut statement = conn
            .prepare("SELECT item, received FROM checklist_items WHERE process_id = ?1")
            .map_err(WorkflowError::sql)?;
        let rows = statement
            .query_map(params![process_id.get()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })
            .map_err(WorkflowError::sql)?;
        for row in rows {
            let (raw, received) = row.map_err(WorkflowError::sql)?;
            let item = ChecklistItem::parse(&raw).ok_or(WorkflowError::CorruptRecord {
                what: "checklist item",
                value: raw,
            })?;
            items.insert(item, received);
        }
        Ok(items)
    }

    fn open_for_access_number(
        &self,
        kind: WorkflowKind,
        access_number: &str,
    ) -> Result<ProcessId, WorkflowError> {
        let mut conn = self.connect()?;
        let tx = begin_write(&mut conn)?;
        let student_id: String = tx
            .query_row(
                "SELECT student_id FROM access_numbers WHERE code = ?1",
                params![access_number],
                |row| row.get(0),
            )
            .optional()
            .map_err(WorkflowError::sql)?
            .ok_or_else(|| WorkflowError::UnknownSubject {
                subject: format!("access number `{access_number}`"),
            })?;
        let (id, _) = get_or_insert_process(
            &tx,
            kind,
            &ProcessSubject::AccessNumber(access_number.to_string()),
            &student_id,
            Some(access_number),
            now_secs(),
        )
        .map_err(WorkflowError::sql)?;
        tx.commit().map_err(WorkflowError::sql)?;
        Ok(id)
    }
}

pub(crate) fn ensure_kind(
    actual: WorkflowKind,
    expected: WorkflowKind,
    process_id: ProcessId,
) -> Result<(), WorkflowError> {
    if actual != expected {
        return Err(WorkflowError::WrongKind {
            process_id,
            expected,
            actual,
        });
    }
    Ok(())
}
