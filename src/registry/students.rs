use super::catalog::{program_by_code_in, required_text, resolve_course_code};
use super::{Registry, RegistryError};
use crate::allocator::{compose_static_code, SequenceCode};
use crate::shared::{new_record_id, now_secs};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Session {
    Day,
    Evening,
    Weekend,
}

impl Session {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Evening => "E",
            Self::Weekend => "W",
        }
    }

    /// Accepts the stored letter or the full name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "d" | "day" => Some(Self::Day),
            "e" | "evening" => Some(Self::Evening),
            "w" | "weekend" => Some(Self::Weekend),
            _ => None,
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub program_code: String,
    pub admission_year: i32,
    pub session: Session,
    pub registration_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub program_id: i64,
    pub admission_year: i32,
    pub session: Session,
    pub registration_number: String,
    pub sequence_code: Option<SequenceCode>,
    pub static_code: Option<String>,
}

impl Registry {
    /// Inserts the student and assigns both sequence and static codes in the
    /// same transaction. If any step fails nothing is persisted and the
    /// counter does not advance.
    pub fn admit_student(&self, student: &NewStudent) -> Result<StudentRecord, RegistryError> {
        let record = self.with_write_lock(|tx| {
            let id = insert_student(tx, student)?;
            self.ensure_static_code(tx, &id)?;
            student_in(tx, &id)?.ok_or_else(|| RegistryError::UnknownStudent {
                student_id: id.clone(),
            })
        })?;
        if let (Some(sequence), Some(static_code)) = (&record.sequence_code, &record.static_code) {
            self.log.info(
                "sequence.allocated",
                &[
                    ("code", Value::from(sequence.to_string())),
                    ("static_code", Value::from(static_code.as_str())),
                    ("student_id", Value::from(record.id.as_str())),
                ],
            );
        }
        Ok(record)
    }

    /// Inserts a record without codes. The codes are assigned the first time
    /// an Access Number is issued to the student.
    pub fn import_student(&self, student: &NewStudent) -> Result<StudentRecord, RegistryError> {
        let conn = self.db.connect()?;
        let id = insert_student(&conn, student)?;
        student_in(&conn, &id)?.ok_or(RegistryError::UnknownStudent { student_id: id })
    }

    pub fn student(&self, student_id: &str) -> Result<StudentRecord, RegistryError> {
        let conn = self.db.connect()?;
        student_in(&conn, student_id)?.ok_or_else(|| RegistryError::UnknownStudent {
            student_id: student_id.to_string(),
        })
    }

    pub fn student_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<Option<StudentRecord>, RegistryError> {
        let conn = self.db.connect()?;
        student_where(&conn, "registration_number = ?1", registration_number.trim())
    }

    pub fn student_by_static_code(
        &self,
        static_code: &str,
    ) -> Result<Option<StudentRecord>, RegistryError> {
        let conn = self.db.connect()?;
        student_where(&conn, "static_code = ?1", static_code.trim())
    }

    /// Returns the student's static code, allocating the sequence code and
    /// composing the static code if the student has none yet. An existing
    /// static code is never rewritten. Callers must hold the write lock.
    pub(crate) fn ensure_static_code(
        &self,
        conn: &Connection,
        student_id: &str,
    ) -> Result<String, RegistryError> {
        let (program_id, existing): (i64, Option<String>) = conn
            .query_row(
                "SELECT program_id, static_code FROM students WHERE id = ?1",
                params![student_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(RegistryError::sql)?
            .ok_or_else(|| RegistryError::UnknownStudent {
                student_id: student_id.to_string(),
            })?;
        if let Some(static_code) = existing {
            return Ok(static_code);
        }

        let course_code = resolve_course_code(conn, program_id)?;
        let sequence = self.next_sequence_code(conn)?;
        let static_code = compose_static_code(&course_code, &sequence);
        conn.execute(
            "
            UPDATE students
            SET sequence_code = ?2, static_code = ?3, updated_at = ?4
            WHERE id = ?1 AND static_code IS NULL
            ",
            params![student_id, sequence.to_string(), static_code, now_secs()],
        )
        .map_err(RegistryError::from_write)?;
        Ok(static_code)
    }
}

fn insert_student(conn: &Connection, student: &NewStudent) -> Result<String, RegistryError> {
    let name = required_text("name", &student.name)?;
    let registration_number = required_text("registration_number", &student.registration_number)?;
    if !(1900..=9999).contains(&student.admission_year) {
        return Err(RegistryError::InvalidField {
            field: "admission_year",
            reason: format!("`{}` is not a valid year", student.admission_year),
        });
    }
    let program = program_by_code_in(conn, student.program_code.trim())?.ok_or_else(|| {
        RegistryError::UnknownProgram {
            program: student.program_code.clone(),
        }
    })?;

    let id = new_record_id().map_err(RegistryError::IdGeneration)?;
    let now = now_secs();
    conn.execute(
        "
        INSERT INTO students (
            id, name, program_id, admission_year, session, registration_number,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        ",
        params![
            id,
            name,
            program.id,
            student.admission_year,
            student.session.as_str(),
            registration_number,
            now
        ],
    )
    .map_err(RegistryError::from_write)?;
    Ok(id)
}

pub(crate) fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, RegistryError> {
    conn.query_row(
        "SELECT 1 FROM students WHERE id = ?1",
        params![student_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(RegistryError::sql)
}

const STUDENT_COLUMNS: &str = "
    id, name, program_id, admission_year, session, registration_number,
    sequence_code, static_code
";

pub(crate) fn student_in(
    conn: &Connection,
    student_id: &str,
) -> Result<Option<StudentRecord>, RegistryError> {
    student_where(conn, "id = ?1", student_id)
}

fn student_where(
    conn: &Connection,
    predicate: &str,
    value: &str,
) -> Result<Option<StudentRecord>, RegistryError> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {predicate}"),
        params![value],
        student_from_row,
    )
    .optional()
    .map_err(RegistryError::sql)?
    .transpose()
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Result<StudentRecord, RegistryError>> {
    let session_raw: String = row.get(4)?;
    let sequence_raw: Option<String> = row.get(6)?;
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let program_id: i64 = row.get(2)?;
    let admission_year: i32 = row.get(3)?;
    let registration_number: String = row.get(5)?;
    let static_code: Option<String> = row.get(7)?;

    let Some(session) = Session::parse(&session_raw) else {
        return Ok(Err(RegistryError::CorruptRecord {
            what: "session",
            value: session_raw,
        }));
    };
    let sequence_code = match sequence_raw {
        Some(raw) => match SequenceCode::parse(&raw) {
            Ok(code) => Some(code),
            Err(source) => {
                return Ok(Err(RegistryError::MalformedStoredCode { value: raw, source }))
            }
        },
        None => None,
    };
    Ok(Ok(StudentRecord {
        id,
        name,
        program_id,
        admission_year,
        session,
        registration_number,
        sequence_code,
        static_code,
    }))
}
