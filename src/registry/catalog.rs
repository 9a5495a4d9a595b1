use super::{Registry, RegistryError};
use crate::allocator::validate_code_segment;
use crate::shared::now_secs;
use crate::store::{date_from_db, date_to_db};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

pub const MAX_SEMESTER_NUMBER: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: i64,
    pub program_id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicYear {
    pub id: i64,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Semester {
    pub id: i64,
    pub academic_year_id: i64,
    pub number: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

impl Semester {
    /// `S1`, `S2`, ... as embedded in semester codes.
    pub fn short_code(&self) -> String {
        format!("S{}", self.number)
    }
}

impl Registry {
    pub fn create_program(&self, code: &str, name: &str) -> Result<Program, RegistryError> {
        let code = code.trim();
        validate_code_segment("program code", code)?;
        let name = required_text("name", name)?;

        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO programs (code, name, created_at) VALUES (?1, ?2, ?3)",
            params![code, name, now_secs()],
        )
        .map_err(RegistryError::from_write)?;
        Ok(Program {
            id: conn.last_insert_rowid(),
            code: code.to_string(),
            name,
        })
    }

    pub fn program_by_code(&self, code: &str) -> Result<Option<Program>, RegistryError> {
        let conn = self.db.connect()?;
        program_by_code_in(&conn, code.trim())
    }

    pub fn create_course(
        &self,
        program_code: &str,
        code: &str,
        name: &str,
        is_active: bool,
    ) -> Result<Course, RegistryError> {
        let code = code.trim();
        validate_code_segment("course code", code)?;
        let name = required_text("name", name)?;

        let conn = self.db.connect()?;
        let program = program_by_code_in(&conn, program_code.trim())?.ok_or_else(|| {
            RegistryError::UnknownProgram {
                program: program_code.to_string(),
            }
        })?;
        conn.execute(
            "
            INSERT INTO courses (program_id, code, name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![program.id, code, name, is_active, now_secs()],
        )
        .map_err(RegistryError::from_write)?;
        Ok(Course {
            id: conn.last_insert_rowid(),
            program_id: program.id,
            code: code.to_string(),
            name,
            is_active,
        })
    }

    pub fn create_academic_year(
        &self,
        label: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AcademicYear, RegistryError> {
        let label = required_text("label", label)?;
        ensure_date_order(start_date, end_date)?;

        let conn = self.db.connect()?;
        conn.execute(
            "
            INSERT INTO academic_years (label, start_date, end_date, is_active)
            VALUES (?1, ?2, ?3, 0)
            ",
            params![label, date_to_db(start_date), date_to_db(end_date)],
        )
        .map_err(RegistryError::from_write)?;
        Ok(AcademicYear {
            id: conn.last_insert_rowid(),
            label,
            start_date,
            end_date,
            is_active: false,
        })
    }

    pub fn academic_year(&self, id: i64) -> Result<AcademicYear, RegistryError> {
        let conn = self.db.connect()?;
        academic_year_in(&conn, id)?.ok_or(RegistryError::UnknownAcademicYear { id })
    }

    pub fn academic_year_by_label(
        &self,
        label: &str,
    ) -> Result<Option<AcademicYear>, RegistryError> {
        let conn = self.db.connect()?;
        conn.query_row(
            "
            SELECT id, label, start_date, end_date, is_active
            FROM academic_years WHERE label = ?1
            ",
            params![label.trim()],
            academic_year_from_row,
        )
        .optional()
        .map_err(RegistryError::sql)?
        .transpose()
    }

    pub fn create_semester(
        &self,
        academic_year_id: i64,
        number: u8,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Semester, RegistryError> {
        if !(1..=MAX_SEMESTER_NUMBER).contains(&number) {
            return Err(RegistryError::InvalidField {
                field: "number",
                reason: format!("semester number must be 1..={MAX_SEMESTER_NUMBER}"),
            });
        }
        ensure_date_order(start_date, end_date)?;

        let conn = self.db.connect()?;
        if academic_year_in(&conn, academic_year_id)?.is_none() {
            return Err(RegistryError::UnknownAcademicYear {
                id: academic_year_id,
            });
        }
        conn.execute(
            "
            INSERT INTO semesters (academic_year_id, number, start_date, end_date, is_active)
            VALUES (?1, ?2, ?3, ?4, 0)
            ",
            params![
                academic_year_id,
                number,
                date_to_db(start_date),
                date_to_db(end_date)
            ],
        )
        .map_err(RegistryError::from_write)?;
        Ok(Semester {
            id: conn.last_insert_rowid(),
            academic_year_id,
            number,
            start_date,
            end_date,
            is_active: false,
        })
    }

    pub fn semester(&self, id: i64) -> Result<Semester, RegistryError> {
        let conn = self.db.connect()?;
        semester_in(&conn, id)?.ok_or(RegistryError::UnknownSemester { id })
    }

    pub fn semester_by_number(
        &self,
        academic_year_id: i64,
        number: u8,
    ) -> Result<Option<Semester>, RegistryError> {
        let conn = self.db.connect()?;
        conn.query_row(
            "
            SELECT id, academic_year_id, number, start_date, end_date, is_active
            FROM semesters WHERE academic_year_id = ?1 AND number = ?2
            ",
            params![academic_year_id, number],
            semester_from_row,
        )
        .optional()
        .map_err(RegistryError::sql)?
        .transpose()
    }

    /// Marks one academic year active and clears the flag on all others.
    pub fn set_active_academic_year(&self, id: i64) -> Result<AcademicYear, RegistryError> {
        self.with_write_lock(|tx| {
            if academic_year_in(tx, id)?.is_none() {
                return Err(RegistryError::UnknownAcademicYear { id });
            }
            tx.execute(
                "UPDATE academic_years SET is_active = (id = ?1)",
                params![id],
            )
            .map_err(RegistryError::sql)?;
            academic_year_in(tx, id)?.ok_or(RegistryError::UnknownAcademicYear { id })
        })
    }

    /// Marks one semester active and clears the flag on all others.
    pub fn set_active_semester(&self, id: i64) -> Result<Semester, RegistryError> {
        self.with_write_lock(|tx| {
            if semester_in(tx, id)?.is_none() {
                return Err(RegistryError::UnknownSemester { id });
            }
            tx.execute("UPDATE semesters SET is_active = (id = ?1)", params![id])
                .map_err(RegistryError::sql)?;
            semester_in(tx, id)?.ok_or(RegistryError::UnknownSemester { id })
        })
    }

    pub fn active_academic_year(&self) -> Result<Option<AcademicYear>, RegistryError> {
        let conn = self.db.connect()?;
        conn.query_row(
            "
            SELECT id, label, start_date, end_date, is_active
            FROM academic_years WHERE is_active = 1
            ",
            [],
            academic_year_from_row,
        )
        .optional()
        .map_err(RegistryError::sql)?
        .transpose()
    }

    pub fn active_semester(&self) -> Result<Option<Semester>, RegistryError> {
        let conn = self.db.connect()?;
        conn.query_row(
            "
            SELECT id, academic_year_id, number, start_date, end_date, is_active
            FROM semesters WHERE is_active = 1
            ",
            [],
            semester_from_row,
        )
        .optional()
        .map_err(RegistryError::sql)?
        .transpose()
    }
}

/// Course code used as the static-code prefix for students of a program:
/// the first active course, else the first course, else the program code.
pub(crate) fn resolve_course_code(
    conn: &Connection,
    program_id: i64,
) -> Result<String, RegistryError> {
    let course: Option<String> = conn
        .query_row(
            "
            SELECT code FROM courses
            WHERE program_id = ?1
            ORDER BY is_active DESC, id ASC
            LIMIT 1
            ",
            params![program_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(RegistryError::sql)?;
    if let Some(code) = course {
        return Ok(code);
    }

    conn.query_row(
        "SELECT code FROM programs WHERE id = ?1",
        params![program_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(RegistryError::sql)?
    .ok_or_else(|| RegistryError::UnknownProgram {
        program: program_id.to_string(),
    })
}

pub(crate) fn program_by_code_in(
    conn: &Connection,
    code: &str,
) -> Result<Option<Program>, RegistryError> {
    conn.query_row(
        "SELECT id, code, name FROM programs WHERE code = ?1",
        params![code],
        |row| {
            Ok(Program {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(RegistryError::sql)
}

pub(crate) fn academic_year_in(
    conn: &Connection,
    id: i64,
) -> Result<Option<AcademicYear>, RegistryError> {
    conn.query_row(
        "
        SELECT id, label, start_date, end_date, is_active
        FROM academic_years WHERE id = ?1
        ",
        params![id],
        academic_year_from_row,
    )
    .optional()
    .map_err(RegistryError::sql)?
    .transpose()
}

pub(crate) fn semester_in(conn: &Connection, id: i64) -> Result<Option<Semester>, RegistryError> {
    conn.query_row(
        "
        SELECT id, academic_year_id, number, start_date, end_date, is_active
        FROM semesters WHERE id = ?1
        ",
        params![id],
        semester_from_row,
    )
    .optional()
    .map_err(RegistryError::sql)?
    .transpose()
}

fn academic_year_from_row(row: &Row<'_>) -> rusqlite::Result<Result<AcademicYear, RegistryError>> {
    let start: String = row.get(2)?;
    let end: String = row.get(3)?;
    let id: i64 = row.get(0)?;
    let label: String = row.get(1)?;
    let is_active: bool = row.get(4)?;
    Ok(parse_date(&start).and_then(|start_date| {
        Ok(AcademicYear {
            id,
            label,
            start_date,
            end_date: parse_date(&end)?,
            is_active,
        })
    }))
}

fn semester_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Semester, RegistryError>> {
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    let id: i64 = row.get(0)?;
    let academic_year_id: i64 = row.get(1)?;
    let number: u8 = row.get(2)?;
    let is_active: bool = row.get(5)?;
    Ok(parse_date(&start).and_then(|start_date| {
        Ok(Semester {
            id,
            academic_year_id,
            number,
            start_date,
            end_date: parse_date(&end)?,
            is_active,
        })
    }))
}

fn parse_date(raw: &str) -> Result<NaiveDate, RegistryError> {
    date_from_db(raw).ok_or_else(|| RegistryError::CorruptRecord {
        what: "date",
        value: raw.to_string(),
    })
}

fn ensure_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), RegistryError> {
    if end < start {
        return Err(RegistryError::InvalidField {
            field: "end_date",
            reason: format!("{end} is before start date {start}"),
        });
    }
    Ok(())
}

pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
