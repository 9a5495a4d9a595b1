use chrono::NaiveDate;
use passbook::config::Settings;
use passbook::registry::{NewStudent, Registry, Session};
use passbook::workflow::{
    Attestation, DeadPeriod, DeadSemesterRequest, ProcessId, ProcessStatus, ResumptionRequest,
    WorkflowEngine, WorkflowError,
};
use tempfile::{tempdir, TempDir};

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

fn setup() -> (TempDir, WorkflowEngine, String) {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::for_database(dir.path().join("passbook.db"));
    let registry = Registry::open(&settings).expect("registry");
    registry.create_program("BAGC", "Guidance").expect("program");
    let student = registry
        .admit_student(&NewStudent {
            name: "Amina Nakato".to_string(),
            program_code: "BAGC".to_string(),
            admission_year: 2024,
            session: Session::Day,
            registration_number: "R1".to_string(),
        })
        .expect("admit");
    let engine = WorkflowEngine::open(&settings).expect("engine");
    (dir, engine, student.id)
}

fn dead_semester(period: DeadPeriod, target_number: u8) -> DeadSemesterRequest {
    DeadSemesterRequest {
        period,
        target_number,
        reason: "financial hardship".to_string(),
        applied_on: date("2024-09-01"),
    }
}

fn resumption() -> ResumptionRequest {
    ResumptionRequest {
        resume_semester: 1,
        resume_year: 2,
        reason: "fees cleared".to_string(),
        applied_on: date("2025-08-01"),
    }
}

fn approve_all(engine: &WorkflowEngine, process: ProcessId) {
    for stage in ["hod", "faculty", "registrar"] {
        engine
            .set_stage_completion(process, stage, &Attestation::new("Officer", date("2024-09-10")))
            .expect("recommend");
    }
}

#[test]
fn resumption_requires_fully_approved_application() {
    let (_dir, engine, student_id) = setup();
    let process = engine
        .file_dead_semester_application(&student_id, &dead_semester(DeadPeriod::Semester, 1))
        .expect("file");
    engine
        .set_stage_completion(process, "hod", &Attestation::new("HOD", date("2024-09-10")))
        .expect("hod");

    let err = engine
        .create_resumption_application(process, &resumption())
        .expect_err("not approved");
    match err {
        WorkflowError::NotApproved { status, .. } => assert_eq!(status, ProcessStatus::Partial),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.resumption_for(process).expect("lookup"), None);
}

#[test]
fn only_one_resumption_per_application() {
    let (_dir, engine, student_id) = setup();
    let process = engine
        .file_dead_semester_application(&student_id, &dead_semester(DeadPeriod::Year, 3))
        .expect("file");
    approve_all(&engine, process);

    let resumption_id = engine
        .create_resumption_application(process, &resumption())
        .expect("first resumption");
    let err = engine
        .create_resumption_application(process, &resumption())
        .expect_err("second resumption");
    assert!(matches!(err, WorkflowError::DuplicateResumption { .. }));

    engine.approve_resumption(resumption_id).expect("approve");
    let application = engine.dead_semester_application(process).expect("load");
    assert!(application.approved());
    assert_eq!(application.period, DeadPeriod::Year);
    let stored = application.resumption.expect("resumption stored");
    assert_eq!(stored.id, resumption_id);
    assert!(stored.approved);
}

#[test]
fn resumption_against_other_process_kind_is_wrong_kind() {
    let (_dir, engine, student_id) = setup();
    let graduation = engine.open_graduation(&student_id).expect("graduation");
    assert!(matches!(
        engine.create_resumption_application(graduation, &resumption()),
        Err(WorkflowError::WrongKind { .. })
    ));
}

#[test]
fn application_ranges_and_reason_are_validated() {
    let (_dir, engine, student_id) = setup();
    for request in [
        dead_semester(DeadPeriod::Semester, 3),
        dead_semester(DeadPeriod::Year, 6),
        dead_semester(DeadPeriod::Year, 0),
        DeadSemesterRequest {
            reason: "  ".to_string(),
            ..dead_semester(DeadPeriod::Semester, 1)
        },
    ] {
        assert!(matches!(
            engine.file_dead_semester_application(&student_id, &request),
            Err(WorkflowError::InvalidField { .. })
        ));
    }

    let process = engine
        .file_dead_semester_application(&student_id, &dead_semester(DeadPeriod::Semester, 2))
        .expect("file");
    approve_all(&engine, process);
    let bad = ResumptionRequest {
        resume_semester: 3,
        ..resumption()
    };
    assert!(matches!(
        engine.create_resumption_application(process, &bad),
        Err(WorkflowError::InvalidField {
            field: "resume_semester",
            ..
        })
    ));
}

#[test]
fn unresolved_applications_are_listed_until_approved() {
    let (_dir, engine, student_id) = setup();
    let first = engine
        .file_dead_semester_application(&student_id, &dead_semester(DeadPeriod::Semester, 1))
        .expect("file");
    let second = engine
        .file_dead_semester_application(&student_id, &dead_semester(DeadPeriod::Semester, 2))
        .expect("file");
    assert_ne!(first, second);
    assert_eq!(
        engine
            .unresolved_dead_semester_applications(&student_id)
            .expect("unresolved"),
        vec![first, second]
    );

    approve_all(&engine, first);
    assert_eq!(
        engine
            .unresolved_dead_semester_applications(&student_id)
            .expect("unresolved"),
        vec![second]
    );
    assert_eq!(
        engine
            .dead_semester_applications(&student_id)
            .expect("all")
            .len(),
        2
    );
}
