use chrono::NaiveDate;
use passbook::config::Settings;
use passbook::registry::{NewStudent, Registry, RegistryError, Session};
use tempfile::tempdir;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

fn registry(dir: &tempfile::TempDir) -> Registry {
    Registry::open(&Settings::for_database(dir.path().join("passbook.db"))).expect("registry")
}

fn student(program: &str, reg: &str) -> NewStudent {
    NewStudent {
        name: "Okello Peter".to_string(),
        program_code: program.to_string(),
        admission_year: 2023,
        session: Session::Weekend,
        registration_number: reg.to_string(),
    }
}

#[test]
fn static_code_prefers_first_active_course_of_program() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    registry.create_program("EDU", "Education").expect("program");
    registry
        .create_course("EDU", "BEDA", "Arts (retired)", false)
        .expect("inactive course");
    registry
        .create_course("EDU", "BEDS", "Science", true)
        .expect("active course");

    let admitted = registry.admit_student(&student("EDU", "R1")).expect("admit");
    assert_eq!(admitted.static_code.as_deref(), Some("BEDS-AA01"));
}

#[test]
fn static_code_falls_back_to_inactive_course_then_program_code() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    registry.create_program("EDU", "Education").expect("program");
    registry.create_program("LAW", "Law").expect("program");
    registry
        .create_course("EDU", "BEDA", "Arts (retired)", false)
        .expect("inactive course");

    let edu = registry.admit_student(&student("EDU", "R1")).expect("admit");
    let law = registry.admit_student(&student("LAW", "R2")).expect("admit");
    assert_eq!(edu.static_code.as_deref(), Some("BEDA-AA01"));
    assert_eq!(law.static_code.as_deref(), Some("LAW-AA02"));
    assert_eq!(
        registry
            .student_by_static_code("LAW-AA02")
            .expect("lookup")
            .map(|record| record.registration_number),
        Some("R2".to_string())
    );
}

#[test]
fn course_codes_containing_separator_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    registry.create_program("EDU", "Education").expect("program");

    let err = registry
        .create_course("EDU", "BED-S", "Science", true)
        .expect_err("separator");
    assert!(matches!(err, RegistryError::Format(_)));
}

#[test]
fn only_one_academic_year_and_semester_are_active() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    let first = registry
        .create_academic_year("2023/2024", date("2023-08-01"), date("2024-07-31"))
        .expect("year");
    let second = registry
        .create_academic_year("2024/2025", date("2024-08-01"), date("2025-07-31"))
        .expect("year");
    let s1 = registry
        .create_semester(second.id, 1, date("2024-08-01"), date("2024-12-20"))
        .expect("semester");
    let s2 = registry
        .create_semester(second.id, 2, date("2025-01-10"), date("2025-05-30"))
        .expect("semester");
    assert_eq!(s2.short_code(), "S2");

    registry.set_active_academic_year(first.id).expect("activate");
    registry.set_active_academic_year(second.id).expect("activate");
    registry.set_active_semester(s1.id).expect("activate");
    registry.set_active_semester(s2.id).expect("activate");

    assert_eq!(
        registry.active_academic_year().expect("active").map(|y| y.id),
        Some(second.id)
    );
    assert_eq!(
        registry.active_semester().expect("active").map(|s| s.id),
        Some(s2.id)
    );
    assert!(!registry.academic_year(first.id).expect("year").is_active);
}

#[test]
fn semester_numbers_and_dates_are_validated() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    let year = registry
        .create_academic_year("2024/2025", date("2024-08-01"), date("2025-07-31"))
        .expect("year");

    assert!(matches!(
        registry.create_semester(year.id, 9, date("2024-08-01"), date("2024-12-20")),
        Err(RegistryError::InvalidField { field: "number", .. })
    ));
    assert!(matches!(
        registry.create_semester(year.id, 1, date("2024-12-20"), date("2024-08-01")),
        Err(RegistryError::InvalidField { field: "end_date", .. })
    ));
    assert!(matches!(
        registry.create_semester(999, 1, date("2024-08-01"), date("2024-12-20")),
        Err(RegistryError::UnknownAcademicYear { id: 999 })
    ));
    registry
        .create_semester(year.id, 1, date("2024-08-01"), date("2024-12-20"))
        .expect("semester");
    assert!(matches!(
        registry.create_semester(year.id, 1, date("2024-08-01"), date("2024-12-20")),
        Err(RegistryError::DuplicateIdentifier { .. })
    ));
}

#[test]
fn admission_requires_known_program_and_registration_number() {
    let dir = tempdir().expect("tempdir");
    let registry = registry(&dir);
    registry.create_program("EDU", "Education").expect("program");

    assert!(matches!(
        registry.admit_student(&student("NOPE", "R1")),
        Err(RegistryError::UnknownProgram { .. })
    ));
    assert!(matches!(
        registry.admit_student(&student("EDU", "   ")),
        Err(RegistryError::InvalidField {
            field: "registration_number",
            ..
        })
    ));
    assert_eq!(registry.last_issued_sequence_code().expect("last"), None);
}
