//! Per-semester records keyed by Access Number. Every course unit, course
//! work and association record gets its own certification process.

use super::access_numbers::access_number_in;
use super::catalog::required_text;
use super::{Registry, RegistryError};
use crate::shared::now_secs;
use crate::store::{begin_write, date_from_db, date_to_db};
use crate::workflow::store::get_or_insert_process;
use crate::workflow::{ProcessId, ProcessSubject, WorkflowKind};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseUnitStatus {
    Passed,
    Missed,
    Retake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseWorkStatus {
    Done,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssociationStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipStatus {
    Done,
    NotDone,
}

macro_rules! db_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

db_enum!(CourseUnitStatus { Passed => "passed", Missed => "missed", Retake => "retake" });
db_enum!(CourseWorkStatus { Done => "done", Missed => "missed" });
db_enum!(AssociationStatus { Active => "active", Inactive => "inactive" });
db_enum!(InternshipStatus { Done => "done", NotDone => "not_done" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCourseUnit {
    pub id: i64,
    pub access_number: String,
    pub course_unit_code: String,
    pub status: Option<CourseUnitStatus>,
    pub certification: ProcessId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCourseWork {
    pub id: i64,
    pub access_number: String,
    pub title: String,
    pub status: Option<CourseWorkStatus>,
    pub score: Option<u32>,
    pub submitted_on: Option<NaiveDate>,
    pub certification: ProcessId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentAssociation {
    pub id: i64,
    pub access_number: String,
    pub association_name: String,
    pub status: AssociationStatus,
    pub joined_on: NaiveDate,
    pub certification: ProcessId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Internship {
    pub access_number: String,
    pub status: InternshipStatus,
    pub company_name: Option<String>,
    pub supervisor_name: Option<String>,
}

impl Registry {
    pub fn enroll_course_unit(
        &self,
        access_number: &str,
        course_unit_code: &str,
    ) -> Result<StudentCourseUnit, RegistryError> {
        let course_unit_code = required_text("course_unit_code", course_unit_code)?;
        let mut conn = self.db.connect()?;
        let tx = begin_write(&mut conn)?;
        let student_id = owning_student(&tx, access_number)?;
        tx.execute(
            "
            INSERT INTO student_course_units (access_number, course_unit_code, status)
            VALUES (?1, ?2, NULL)
            ",
            params![access_number, course_unit_code],
        )
        .map_err(RegistryError::from_write)?;
        let id = tx.last_insert_rowid();
        let certification = open_certification(
            &tx,
            ProcessSubject::CourseUnit(id),
            &student_id,
            access_number,
        )?;
        tx.commit().map_err(RegistryError::sql)?;
        Ok(StudentCourseUnit {
            id,
            access_number: access_number.to_string(),
            course_unit_code,
            status: None,
            certification,
        })
    }

    pub fn set_course_unit_status(
        &self,
        record_id: i64,
        status: CourseUnitStatus,
    ) -> Result<(), RegistryError> {
        let conn = self.db.connect()?;
        update_record(
            &conn,
            "UPDATE student_course_units SET status = ?2 WHERE id = ?1",
            record_id,
            status.as_str(),
            "course unit",
        )
    }

    pub fn course_units_for(
        &self,
        access_number: &str,
    ) -> Result<Vec<StudentCourseUnit>, RegistryError> {
        let conn = self.db.connect()?;
        let mut statement = conn
            .prepare(
                "
                SELECT scu.id, scu.course_unit_code, scu.status, ap.id
                FROM student_course_units scu
                JOIN approval_processes ap
                  ON ap.kind = 'certification'
                 AND ap.subject_kind = 'course_unit'
                 AND ap.subject_ref = CAST(scu.id AS TEXT)
                WHERE scu.access_number = ?1
                ORDER BY scu.course_unit_code ASC
                ",
            )
            .map_err(RegistryError::sql)?;
        let rows = statement
            .query_map(params![access_number], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(RegistryError::sql)?;

        let mut units = Vec::new();
        for row in rows {
            let (id, course_unit_code, status, process_id) = row.map_err(RegistryError::sql)?;
            units.push(StudentCourseUnit {
                id,
                access_number: access_number.to_string(),
                course_unit_code,
                status: parse_optional(status, CourseUnitStatus::parse, "course unit status")?,
                certification: ProcessId(process_id),
            });
        }
        Ok(units)
    }

    pub fn assign_course_work(
        &self,
        access_number: &str,
        title: &str,
    ) -> Result<StudentCourseWork, RegistryError> {
        let title = required_text("title", title)?;
        let mut conn = self.db.connect()?;
        let tx = begin_write(&mut conn)?;
        let student_id = owning_student(&tx, access_number)?;
        tx.execute(
            "
            INSERT INTO student_course_works (access_number, title, status)
            VALUES (?1, ?2, NULL)
            ",
            params![access_number, title],
        )
        .map_err(RegistryError::from_write)?;
        let id = tx.last_insert_rowid();
        let certification = open_certification(
            &tx,
            ProcessSubject::CourseWork(id),
            &student_id,
            access_number,
        )?;
        tx.commit().map_err(RegistryError::sql)?;
        Ok(StudentCourseWork {
            id,
            access_number: access_number.to_string(),
            title,
            status: None,
            score: None,
            submitted_on: None,
            certification,
        })
    }

    pub fn set_course_work_status(
        &self,
        record_id: i64,
        status: CourseWorkStatus,
        score: Option<u32>,
        submitted_on: Option<NaiveDate>,
    ) -> Result<(), RegistryError> {
        let conn = self.db.connect()?;
        let updated = conn
            .execute(
                "
                UPDATE student_course_works
                SET status = ?2,
                    score = COALESCE(?3, score),
                    submitted_on = COALESCE(?4, submitted_on)
                WHERE id = ?1
                ",
                params![
                    record_id,
                    status.as_str(),
                    score,
                    submitted_on.map(date_to_db)
                ],
            )
            .map_err(RegistryError::sql)?;
        if updated == 0 {
            return Err(RegistryError::UnknownRecord {
                what: "course work",
                id: record_id,
            });
        }
        Ok(())
    }

    pub fn course_work(&self, record_id: i64) -> Result<StudentCourseWork, RegistryError> {
        let conn = self.db.connect()?;
        let row = conn
            .query_row(
                "
                SELECT scw.access_number, scw.title, scw.status, scw.score,
                       scw.submitted_on, ap.id
                FROM student_course_works scw
                JOIN approval_processes ap
                  ON ap.kind = 'certification'
                 AND ap.subject_kind = 'course_work'
                 AND ap.subject_ref = CAST(scw.id AS TEXT)
                WHERE scw.id = ?1
                ",
                params![record_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<u32>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(RegistryError::sql)?
            .ok_or(RegistryError::UnknownRecord {
                what: "course work",
                id: record_id,
            })?;
        let (access_number, title, status, score, submitted_on, process_id) = row;
        Ok(StudentCourseWork {
            id: record_id,
            access_number,
            title,
            status: parse_optional(status, CourseWorkStatus::parse, "course work status")?,
            score,
            submitted_on: parse_optional(submitted_on, date_from_db, "date")?,
            certification: ProcessId(process_id),
        })
    }

    pub fn join_association(
        &self,
        access_number: &str,
        association_name: &str,
        joined_on: NaiveDate,
    ) -> Result<StudentAssociation, RegistryError> {
        let association_name = required_text("association_name", association_name)?;
        let mut conn = self.db.connect()?;
        let tx = begin_write(&mut conn)?;
        let student_id = owning_student(&tx, access_number)?;
        tx.execute(
            "
            INSERT INTO student_associations (access_number, association_name, status, joined_on)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                access_number,
                association_name,
                AssociationStatus::Active.as_str(),
                date_to_db(joined_on)
            ],
        )
        .map_err(RegistryError::from_write)?;
        let id = tx.last_insert_rowid();
        let certification = open_certification(
            &tx,
            ProcessSubject::Association(id),
            &student_id,
            access_number,
        )?;
        tx.commit().map_err(RegistryError::sql)?;
        Ok(StudentAssociation {
            id,
            access_number: access_number.to_string(),
            association_name,
            status: AssociationStatus::Active,
            joined_on,
            certification,
        })
    }

    pub fn set_association_status(
        &self,
        record_id: i64,
        status: AssociationStatus,
    ) -> Result<(), RegistryError> {
        let conn = self.db.connect()?;
        update_record(
            &conn,
            "UPDATE student_associations SET status = ?2 WHERE id = ?1",
            record_id,
            status.as_str(),
            "association",
        )
    }

    /// Creates or replaces the internship record for the Access Number.
    pub fn record_internship(
        &self,
        access_number: &str,
        status: InternshipStatus,
        company_name: Option<&str>,
        supervisor_name: Option<&str>,
    ) -> Result<Internship, RegistryError> {
        let conn = self.db.connect()?;
        owning_student(&conn, access_number)?;
        let company_name = trimmed_optional(company_name);
        let supervisor_name = trimmed_optional(supervisor_name);
        conn.execute(
            "
            INSERT INTO internships (access_number, status, company_name, supervisor_name, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(access_number) DO UPDATE SET
                status = excluded.status,
                company_name = excluded.company_name,
                supervisor_name = excluded.supervisor_name,
                updated_at = excluded.updated_at
            ",
            params![
                access_number,
                status.as_str(),
                company_name,
                supervisor_name,
                now_secs()
            ],
        )
        .map_err(RegistryError::sql)?;
        Ok(Internship {
            access_number: access_number.to_string(),
            status,
            company_name,
            supervisor_name,
        })
    }
}

fn owning_student(conn: &Connection, access_number: &str) -> Result<String, RegistryError> {
    access_number_in(conn, access_number)?
        .map(|identifier| identifier.student_id)
        .ok_or_else(|| RegistryError::UnknownAccessNumber {
            code: access_number.to_string(),
        })
}

fn open_certification(
    conn: &Connection,
    subject: ProcessSubject,
    student_id: &str,
    access_number: &str,
) -> Result<ProcessId, RegistryError> {
    get_or_insert_process(
        conn,
        WorkflowKind::Certification,
        &subject,
        student_id,
        Some(access_number),
        now_secs(),
    )
    .map(|(id, _)| id)
    .map_err(RegistryError::sql)
}

fn update_record(
    conn: &Connection,
    sql: &str,
    record_id: i64,
    value: &str,
    what: &'static str,
) -> Result<(), RegistryError> {
    let updated = conn
        .execute(sql, params![record_id, value])
        .map_err(RegistryError::sql)?;
    if updated == 0 {
        return Err(RegistryError::UnknownRecord {
            what,
            id: record_id,
        });
    }
    Ok(())
}

fn parse_optional<T>(
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
    what: &'static str,
) -> Result<Option<T>, RegistryError> {
    match raw {
        Some(value) => parse(&value)
            .map(Some)
            .ok_or(RegistryError::CorruptRecord { what, value }),
        None => Ok(None),
    }
}

fn trimmed_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
