use super::catalog::{academic_year_in, semester_in, Semester};
use super::students::student_exists;
use super::{Registry, RegistryError};
use crate::allocator::compose_semester_code;
use crate::shared::now_secs;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

pub const MAX_YEAR_OF_STUDY: u8 = 5;

/// A per-semester Access Number (semester code) held by one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterIdentifier {
    pub code: String,
    pub student_id: String,
    pub academic_year_id: i64,
    pub semester_id: i64,
    pub year_of_study: u8,
    pub is_active: bool,
    /// Unix seconds at issue.
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessNumberRequest {
    pub academic_year_id: i64,
    pub semester_id: i64,
    pub year_of_study: u8,
}

#[derive(Debug)]
pub struct BulkIssueOutcome {
    pub student_id: String,
    pub result: Result<SemesterIdentifier, RegistryError>,
}

impl Registry {
    /// Issues one Access Number. A student may hold only one per
    /// (academic year, semester); a second request is `DuplicateIdentifier`.
    pub fn issue_access_number(
        &self,
        student_id: &str,
        request: AccessNumberRequest,
    ) -> Result<SemesterIdentifier, RegistryError> {
        let issued = self.with_write_lock(|tx| {
            let semester = check_request(tx, request)?;
            if let Some(existing) = existing_code(tx, student_id, request)? {
                return Err(RegistryError::DuplicateIdentifier {
                    what: format!(
                        "student `{student_id}` already holds `{existing}` for semester `{}`",
                        request.semester_id
                    ),
                });
            }
            if !student_exists(tx, student_id)? {
                return Err(RegistryError::UnknownStudent {
                    student_id: student_id.to_string(),
                });
            }
            let static_code = self.ensure_static_code(tx, student_id)?;
            let code = compose_semester_code(&static_code, &semester.short_code())?;
            insert_access_number(tx, &code, student_id, request)
        })?;

        self.log.info(
            "access_number.issued",
            &[
                ("code", Value::from(issued.code.as_str())),
                ("student_id", Value::from(student_id)),
            ],
        );
        Ok(issued)
    }

    /// Issues Access Numbers to many students for one semester.
    ///
    /// The batch holds the write lock once. Students that already hold a
    /// code for the pair are left out of the result. Every remaining student
    /// gets an outcome in input order; a failure for one student leaves the
    /// others untouched.
    pub fn bulk_issue_access_numbers(
        &self,
        student_ids: &[String],
        request: AccessNumberRequest,
    ) -> Result<Vec<BulkIssueOutcome>, RegistryError> {
        let outcomes = self.with_write_lock(|tx| {
            let semester = check_request(tx, request)?;

            let mut seen = HashSet::new();
            let mut planned: Vec<(String, Result<String, RegistryError>)> = Vec::new();
            for student_id in student_ids {
                if !seen.insert(student_id.as_str()) {
                    continue;
                }
                if existing_code(tx, student_id, request)?.is_some() {
                    continue;
                }
                if !student_exists(tx, student_id)? {
                    planned.push((
                        student_id.clone(),
                        Err(RegistryError::UnknownStudent {
                            student_id: student_id.clone(),
                        }),
                    ));
                    continue;
                }
                let code = self.plan_code(tx, student_id, &semester);
                planned.push((student_id.clone(), code));
            }

            let mut outcomes = Vec::with_capacity(planned.len());
            for (student_id, code) in planned {
                let result = code.and_then(|code| {
                    let savepoint = tx.savepoint().map_err(RegistryError::sql)?;
                    let issued = insert_access_number(&savepoint, &code, &student_id, request)?;
                    savepoint.commit().map_err(RegistryError::sql)?;
                    Ok(issued)
                });
                outcomes.push(BulkIssueOutcome { student_id, result });
            }
            Ok(outcomes)
        })?;

        let issued = outcomes.iter().filter(|item| item.result.is_ok()).count();
        self.log.info(
            "access_number.bulk_completed",
            &[
                ("semester_id", Value::from(request.semester_id)),
                ("requested", Value::from(student_ids.len())),
                ("issued", Value::from(issued)),
                ("failed", Value::from(outcomes.len() - issued)),
            ],
        );
        Ok(outcomes)
    }

    pub fn access_number(&self, code: &str) -> Result<SemesterIdentifier, RegistryError> {
        let conn = self.db.connect()?;
        access_number_in(&conn, code)?.ok_or_else(|| RegistryError::UnknownAccessNumber {
            code: code.to_string(),
        })
    }

    /// The student's active Access Number for the pair, if any.
    pub fn current_access_number(
        &self,
        student_id: &str,
        academic_year_id: i64,
        semester_id: i64,
    ) -> Result<Option<SemesterIdentifier>, RegistryError> {
        let conn = self.db.connect()?;
        conn.query_row(
            &format!(
                "SELECT {ACCESS_COLUMNS} FROM access_numbers
                 WHERE student_id = ?1 AND academic_year_id = ?2 AND semester_id = ?3
                   AND is_active = 1"
            ),
            params![student_id, academic_year_id, semester_id],
            access_number_from_row,
        )
        .optional()
        .map_err(RegistryError::sql)
    }

    pub fn access_numbers_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<SemesterIdentifier>, RegistryError> {
        let conn = self.db.connect()?;
        let mut statement = conn
            .prepare(&format!(
                "SELECT {ACCESS_COLUMNS} FROM access_numbers
                 WHERE student_id = ?1
                 ORDER BY academic_year_id ASC, semester_id ASC"
            ))
            .map_err(RegistryError::sql)?;
        let rows = statement
            .query_map(params![student_id], access_number_from_row)
            .map_err(RegistryError::sql)?;
        let mut identifiers = Vec::new();
        for row in rows {
            identifiers.push(row.map_err(RegistryError::sql)?);
        }
        Ok(identifiers)
    }

    pub fn access_numbers_for_semester(
        &self,
        semester_id: i64,
    ) -> Result<Vec<SemesterIdentifier>, RegistryError> {
        let conn = self.db.connect()?;
        let mut statement = conn
            .prepare(&format!(
                "SELECT {ACCESS_COLUMNS} FROM access_numbers
                 WHERE semester_id = ?1 ORDER BY code ASC"
            ))
            .map_err(RegistryError::sql)?;
        let rows = statement
            .query_map(params![semester_id], access_number_from_row)
            .map_err(RegistryError::sql)?;
        let mut identifiers = Vec::new();
        for row in rows {
            identifiers.push(row.map_err(RegistryError::sql)?);
        }
        Ok(identifiers)
    }

    /// Deactivated codes stay reserved; they are never reissued.
    pub fn deactivate_access_number(
        &self,
        code: &str,
    ) -> Result<SemesterIdentifier, RegistryError> {
        let identifier = self.set_access_number_active(code, false)?;
        self.log.info(
            "access_number.deactivated",
            &[("code", Value::from(code))],
        );
        Ok(identifier)
    }

    pub fn reactivate_access_number(
        &self,
        code: &str,
    ) -> Result<SemesterIdentifier, RegistryError> {
        let identifier = self.set_access_number_active(code, true)?;
        self.log.info(
            "access_number.reactivated",
            &[("code", Value::from(code))],
        );
        Ok(identifier)
    }

    fn set_access_number_active(
        &self,
        code: &str,
        active: bool,
    ) -> Result<SemesterIdentifier, RegistryError> {
        let conn = self.db.connect()?;
        let updated = conn
            .execute(
                "UPDATE access_numbers SET is_active = ?2 WHERE code = ?1",
                params![code, active],
            )
            .map_err(RegistryError::sql)?;
        if updated == 0 {
            return Err(RegistryError::UnknownAccessNumber {
                code: code.to_string(),
            });
        }
        access_number_in(&conn, code)?.ok_or_else(|| RegistryError::UnknownAccessNumber {
            code: code.to_string(),
        })
    }

    /// Resolves the semester code for one bulk item. A student missing a
    /// static code gets one inside a savepoint so a failure rolls back only
    /// that student's allocation.
    fn plan_code(
        &self,
        tx: &mut rusqlite::Transaction<'_>,
        student_id: &str,
        semester: &Semester,
    ) -> Result<String, RegistryError> {
        let savepoint = tx.savepoint().map_err(RegistryError::sql)?;
        let static_code = self.ensure_static_code(&savepoint, student_id)?;
        let code = compose_semester_code(&static_code, &semester.short_code())?;
        savepoint.commit().map_err(RegistryError::sql)?;
        Ok(code)
    }
}

/// Validates the (year, semester, year of study) triple and returns the
/// semester.
fn check_request(
    conn: &Connection,
    request: AccessNumberRequest,
) -> Result<Semester, RegistryError> {
    if !(1..=MAX_YEAR_OF_STUDY).contains(&request.year_of_study) {
        return Err(RegistryError::InvalidField {
            field: "year_of_study",
            reason: format!("must be 1..={MAX_YEAR_OF_STUDY}"),
        });
    }
    if academic_year_in(conn, request.academic_year_id)?.is_none() {
        return Err(RegistryError::UnknownAcademicYear {
            id: request.academic_year_id,
        });
    }
    let semester = semester_in(conn, request.semester_id)?.ok_or(
        RegistryError::UnknownSemester {
            id: request.semester_id,
        },
    )?;
    if semester.academic_year_id != request.academic_year_id {
        return Err(RegistryError::SemesterYearMismatch {
            semester_id: request.semester_id,
            academic_year_id: request.academic_year_id,
        });
    }
    Ok(semester)
}

fn existing_code(
    conn: &Connection,
    student_id: &str,
    request: AccessNumberRequest,
) -> Result<Option<String>, RegistryError> {
    conn.query_row(
        "
        SELECT code FROM access_numbers
        WHERE student_id = ?1 AND academic_year_id = ?2 AND semester_id = ?3
        ",
        params![student_id, request.academic_year_id, request.semester_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(RegistryError::sql)
}

fn insert_access_number(
    conn: &Connection,
    code: &str,
    student_id: &str,
    request: AccessNumberRequest,
) -> Result<SemesterIdentifier, RegistryError> {
    let created_at = now_secs();
    conn.execute(
        "
        INSERT INTO access_numbers (
            code, student_id, academic_year_id, semester_id, year_of_study,
            is_active, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        ",
        params![
            code,
            student_id,
            request.academic_year_id,
            request.semester_id,
            request.year_of_study,
            created_at
        ],
    )
    .map_err(RegistryError::from_write)?;
    Ok(SemesterIdentifier {
        code: code.to_string(),
        student_id: student_id.to_string(),
        academic_year_id: request.academic_year_id,
        semester_id: request.semester_id,
        year_of_study: request.year_of_study,
        is_active: true,
        created_at,
    })
}

const ACCESS_COLUMNS: &str =
    "code, student_id, academic_year_id, semester_id, year_of_study, is_active, created_at";

pub(crate) fn access_number_in(
    conn: &Connection,
    code: &str,
) -> Result<Option<SemesterIdentifier>, RegistryError> {
    conn.query_row(
        &format!("SELECT {ACCESS_COLUMNS} FROM access_numbers WHERE code = ?1"),
        params![code],
        access_number_from_row,
    )
    .optional()
    .map_err(RegistryError::sql)
}

fn access_number_from_row(row: &Row<'_>) -> rusqlite::Result<SemesterIdentifier> {
    Ok(SemesterIdentifier {
        code: row.get(0)?,
        student_id: row.get(1)?,
        academic_year_id: row.get(2)?,
        semester_id: row.get(3)?,
        year_of_study: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}
