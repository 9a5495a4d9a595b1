use super::engine::{ensure_kind, WorkflowEngine};
use super::error::WorkflowError;
use super::kinds::WorkflowKind;
use super::status::ProcessStatus;
use super::store::{load_header, load_process};
use super::ProcessId;
use crate::store::Database;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;

/// One reason a student cannot yet be cleared for graduation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Blocker {
    CourseUnit {
        access_number: String,
        course_unit_code: String,
        status: String,
    },
    CourseWork {
        access_number: String,
        title: String,
    },
    InternshipIncomplete,
    DeadSemesterUnresolved {
        process_id: ProcessId,
    },
}

impl std::fmt::Display for Blocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CourseUnit {
                access_number,
                course_unit_code,
                status,
            } => write!(f, "course unit {course_unit_code} is {status} ({access_number})"),
            Self::CourseWork {
                access_number,
                title,
            } => write!(f, "course work `{title}` was missed ({access_number})"),
            Self::InternshipIncomplete => write!(f, "internship not done"),
            Self::DeadSemesterUnresolved { process_id } => {
                write!(f, "dead semester application {process_id} is unresolved")
            }
        }
    }
}

/// Read-only view of completion facts owned by other subsystems.
pub trait BlockerSource {
    fn outstanding_blockers(&self, student_id: &str) -> Result<Vec<Blocker>, WorkflowError>;
}

/// Blockers computed from the registry tables: course units marked missed or
/// retake, missed course works, no completed internship, and dead-semester
/// applications still awaiting a recommendation.
#[derive(Debug, Clone)]
pub struct RegistryBlockerSource {
    db: Database,
    require_internship: bool,
}

impl RegistryBlockerSource {
    pub fn new(db: Database, require_internship: bool) -> Self {
        Self {
            db,
            require_internship,
        }
    }
}

impl BlockerSource for RegistryBlockerSource {
    fn outstanding_blockers(&self, student_id: &str) -> Result<Vec<Blocker>, WorkflowError> {
        let conn = self.db.connect()?;
        let mut blockers = course_unit_blockers(&conn, student_id)?;
        blockers.extend(course_work_blockers(&conn, student_id)?);
        if self.require_internship && !internship_done(&conn, student_id)? {
            blockers.push(Blocker::InternshipIncomplete);
        }
        blockers.extend(dead_semester_blockers(&conn, student_id)?);
        Ok(blockers)
    }
}

impl WorkflowEngine {
    /// Sets the graduation "all requirements met" gate. When a blocker source
    /// is supplied and reports anything outstanding, the gate stays closed.
    pub fn confirm_graduation_requirements(
        &self,
        process_id: ProcessId,
        blockers: Option<&dyn BlockerSource>,
    ) -> Result<ProcessStatus, WorkflowError> {
        let conn = self.connect()?;
        let header = load_header(&conn, process_id)?;
        ensure_kind(header.kind, WorkflowKind::Graduation, process_id)?;

        if let Some(source) = blockers {
            let outstanding = source.outstanding_blockers(&header.student_id)?;
            if !outstanding.is_empty() {
                self.log().info(
                    "graduation.gate_refused",
                    &[
                        ("process_id", Value::from(process_id.get())),
                        ("student_id", Value::from(header.student_id.as_str())),
                        (
                            "blockers",
                            Value::from(
                                outstanding
                                    .iter()
                                    .map(ToString::to_string)
                                    .collect::<Vec<_>>(),
                            ),
                        ),
                    ],
                );
                return Err(WorkflowError::OutstandingBlockers {
                    student_id: header.student_id,
                    blockers: outstanding,
                });
            }
        }

        conn.execute(
            "UPDATE approval_processes SET requirements_met = 1 WHERE id = ?1",
            params![process_id.get()],
        )
        .map_err(WorkflowError::sql)?;
        let status = load_process(&conn, process_id)?.status();

        self.log().info(
            "graduation.gate_opened",
            &[
                ("process_id", Value::from(process_id.get())),
                ("student_id", Value::from(header.student_id.as_str())),
                ("status", Value::from(status.as_str())),
            ],
        );
        Ok(status)
    }
}

fn course_unit_blockers(
    conn: &Connection,
    student_id: &str,
) -> Result<Vec<Blocker>, WorkflowError> {
    let mut statement = conn
        .prepare(
            "
            SELECT scu.access_number, scu.course_unit_code, scu.status
            FROM student_course_units scu
            JOIN access_numbers an ON an.code = scu.access_number
            WHERE an.student_id = ?1 AND scu.status IN ('missed', 'retake')
            ORDER BY scu.access_number ASC, scu.course_unit_code ASC
            ",
        )
        .map_err(WorkflowError::sql)?;
    let rows = statement
        .query_map(params![student_id], |row| {
            Ok(Blocker::CourseUnit {
                access_number: row.get(0)?,
                course_unit_code: row.get(1)?,
                status: row.get(2)?,
            })
        })
        .map_err(WorkflowError::sql)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(WorkflowError::sql)?);
    }
    Ok(out)
}

fn course_work_blockers(
    conn: &Connection,
    student_id: &str,
) -> Result<Vec<Blocker>, WorkflowError> {
    let mut statement = conn
        .prepare(
            "
            SELECT scw.access_number, scw.title
            FROM student_course_works scw
            JOIN access_numbers an ON an.code = scw.access_number
            WHERE an.student_id = ?1 AND scw.status = 'missed'
            ORDER BY scw.access_number ASC, scw.title ASC
            ",
        )
        .map_err(WorkflowError::sql)?;
    let rows = statement
        .query_map(params![student_id], |row| {
            Ok(Blocker::CourseWork {
                access_number: row.get(0)?,
                title: row.get(1)?,
            })
        })
        .map_err(WorkflowError::sql)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(WorkflowError::sql)?);
    }
    Ok(out)
}

fn internship_done(conn: &Connection, student_id: &str) -> Result<bool, WorkflowError> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*) FROM internships i
            JOIN access_numbers an ON an.code = i.access_number
            WHERE an.student_id = ?1 AND i.status = 'done'
            ",
            params![student_id],
            |row| row.get(0),
        )
        .map_err(WorkflowError::sql)?;
    Ok(count > 0)
}

fn dead_semester_blockers(
    conn: &Connection,
    student_id: &str,
) -> Result<Vec<Blocker>, WorkflowError> {
    let mut statement = conn
        .prepare(
            "
            SELECT p.id FROM approval_processes p
            WHERE p.student_id = ?1 AND p.kind = ?2
              AND EXISTS (
                  SELECT 1 FROM approval_stages s
                  WHERE s.process_id = p.id AND s.completed = 0
              )
            ORDER BY p.id ASC
            ",
        )
        .map_err(WorkflowError::sql)?;
    let rows = statement
        .query_map(
            params![student_id, WorkflowKind::DeadSemester.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .map_err(WorkflowError::sql)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(Blocker::DeadSemesterUnresolved {
            process_id: ProcessId(row.map_err(WorkflowError::sql)?),
        });
    }
    Ok(out)
}
