use chrono::NaiveDate;
use passbook::config::Settings;
use passbook::registry::{AccessNumberRequest, NewStudent, Registry, Session};
use passbook::workflow::{
    Attestation, ProcessId, ProcessStatus, Stage, WorkflowEngine, WorkflowError, WorkflowKind,
};
use std::sync::Barrier;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    registry: Registry,
    engine: WorkflowEngine,
    student_id: String,
    access_number: String,
    semester_id: i64,
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::for_database(dir.path().join("passbook.db"));
    let registry = Registry::open(&settings).expect("registry");
    let engine = WorkflowEngine::open(&settings).expect("engine");

    registry.create_program("BAGC", "Guidance").expect("program");
    let year = registry
        .create_academic_year("2024/2025", date("2024-08-01"), date("2025-07-31"))
        .expect("year");
    let semester = registry
        .create_semester(year.id, 1, date("2024-08-01"), date("2024-12-20"))
        .expect("semester");
    let student = registry
        .admit_student(&NewStudent {
            name: "Amina Nakato".to_string(),
            program_code: "BAGC".to_string(),
            admission_year: 2024,
            session: Session::Day,
            registration_number: "R1".to_string(),
        })
        .expect("admit");
    let issued = registry
        .issue_access_number(
            &student.id,
            AccessNumberRequest {
                academic_year_id: year.id,
                semester_id: semester.id,
                year_of_study: 1,
            },
        )
        .expect("issue");

    Fixture {
        _dir: dir,
        registry,
        engine,
        student_id: student.id,
        access_number: issued.code,
        semester_id: semester.id,
    }
}

fn sign(officer: &str) -> Attestation {
    Attestation::new(officer, date("2024-09-02")).with_designation("Officer")
}

fn dead_semester_process(fixture: &Fixture) -> ProcessId {
    fixture
        .engine
        .file_dead_semester_application(
            &fixture.student_id,
            &passbook::workflow::DeadSemesterRequest {
                period: passbook::workflow::DeadPeriod::Semester,
                target_number: 1,
                reason: "medical leave".to_string(),
                applied_on: date("2024-09-01"),
            },
        )
        .expect("file application")
}

#[test]
fn status_follows_stage_completion_across_three_stages() {
    let fixture = fixture();
    let process = dead_semester_process(&fixture);
    let engine = &fixture.engine;

    assert_eq!(engine.get_status(process).expect("status"), ProcessStatus::Pending);
    assert_eq!(
        engine
            .set_stage_completion(process, "hod", &sign("Dr. Mugisha"))
            .expect("hod"),
        ProcessStatus::Partial
    );
    assert_eq!(
        engine
            .set_stage_completion(process, "faculty", &sign("Dean Atim"))
            .expect("faculty"),
        ProcessStatus::Partial
    );
    assert_eq!(
        engine
            .set_stage_completion(process, "registrar", &sign("Registrar Ouma"))
            .expect("registrar"),
        ProcessStatus::Approved
    );

    let stored = engine.process(process).expect("process");
    let hod = stored.stage(Stage::Hod).expect("hod stage");
    assert_eq!(hod.officer_name.as_deref(), Some("Dr. Mugisha"));
    assert_eq!(hod.designation.as_deref(), Some("Officer"));
    assert_eq!(hod.completed_on, Some(date("2024-09-02")));
}

#[test]
fn re_signing_a_completed_stage_overwrites_officer_and_date() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_registration(&fixture.access_number)
        .expect("open");
    let engine = &fixture.engine;

    let first = engine
        .set_stage_completion(process, "finance", &sign("Bursar Okello"))
        .expect("first signature");
    assert_eq!(first, ProcessStatus::Partial);

    let corrected = Attestation::new("Bursar Nambi", date("2024-09-10"))
        .with_designation("Senior Bursar");
    let second = engine
        .set_stage_completion(process, "finance", &corrected)
        .expect("second signature");
    assert_eq!(second, first);

    let stored = engine.process(process).expect("process");
    let finance = stored.stage(Stage::Finance).expect("finance stage");
    assert!(finance.completed);
    assert_eq!(finance.officer_name.as_deref(), Some("Bursar Nambi"));
    assert_eq!(finance.designation.as_deref(), Some("Senior Bursar"));
    assert_eq!(finance.completed_on, Some(date("2024-09-10")));
    assert_eq!(stored.status(), ProcessStatus::Partial);
}

#[test]
fn concurrent_signatures_on_distinct_stages_all_land() {
    let fixture = fixture();
    let engine = &fixture.engine;

    for _ in 0..10 {
        let process = dead_semester_process(&fixture);
        let barrier = Barrier::new(3);
        let results: Vec<Result<ProcessStatus, WorkflowError>> = std::thread::scope(|scope| {
            let workers: Vec<_> = [
                ("hod", "Dr. Mugisha"),
                ("faculty", "Dean Atim"),
                ("registrar", "Registrar Ouma"),
            ]
            .into_iter()
            .map(|(stage, officer)| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.set_stage_completion(process, stage, &sign(officer))
                })
            })
            .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().expect("worker"))
                .collect()
        });

        for result in &results {
            assert!(result.is_ok(), "signature failed: {result:?}");
        }
        assert_eq!(
            engine.get_status(process).expect("status"),
            ProcessStatus::Approved
        );
    }
}

#[test]
fn unknown_stage_is_rejected_without_changing_status() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_semester_clearance(&fixture.access_number)
        .expect("open");

    let err = fixture
        .engine
        .set_stage_completion(process, "orientation", &sign("Someone"))
        .expect_err("clearance has no orientation stage");
    assert!(matches!(err, WorkflowError::UnknownStage { .. }));
    assert_eq!(
        fixture.engine.get_status(process).expect("status"),
        ProcessStatus::Pending
    );
}

#[test]
fn incomplete_attestation_does_not_complete_stage() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_registration(&fixture.access_number)
        .expect("open");

    let err = fixture
        .engine
        .set_stage_completion(process, "finance", &sign("   "))
        .expect_err("blank officer");
    assert!(matches!(
        err,
        WorkflowError::IncompleteAttestation {
            stage: Stage::Finance,
            field: "officer_name"
        }
    ));

    let mut undated = sign("Bursar");
    undated.completed_on = None;
    let err = fixture
        .engine
        .set_stage_completion(process, "finance", &undated)
        .expect_err("no date");
    assert!(matches!(
        err,
        WorkflowError::IncompleteAttestation {
            field: "completed_on",
            ..
        }
    ));
    assert_eq!(
        fixture.engine.get_status(process).expect("status"),
        ProcessStatus::Pending
    );
}

#[test]
fn opening_is_idempotent_per_subject() {
    let fixture = fixture();
    let first = fixture
        .engine
        .open_registration(&fixture.access_number)
        .expect("open");
    let again = fixture
        .engine
        .open_registration(&fixture.access_number)
        .expect("open again");
    let clearance = fixture
        .engine
        .open_semester_clearance(&fixture.access_number)
        .expect("clearance");
    assert_eq!(first, again);
    assert_ne!(first, clearance);

    let stored = fixture.engine.process(first).expect("process");
    assert_eq!(stored.kind, WorkflowKind::Registration);
    assert_eq!(stored.stages.len(), 4);
    assert_eq!(stored.access_number.as_deref(), Some(fixture.access_number.as_str()));
}

#[test]
fn bulk_clearance_opens_one_process_per_access_number() {
    let fixture = fixture();
    assert_eq!(
        fixture
            .engine
            .open_semester_clearances_for_semester(fixture.semester_id)
            .expect("bulk open"),
        1
    );
    assert_eq!(
        fixture
            .engine
            .open_semester_clearances_for_semester(fixture.semester_id)
            .expect("bulk open again"),
        0
    );
    assert!(matches!(
        fixture.engine.open_semester_clearances_for_semester(999),
        Err(WorkflowError::UnknownSubject { .. })
    ));
}

#[test]
fn revoking_is_allowed_until_the_process_is_approved() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_semester_clearance(&fixture.access_number)
        .expect("open");
    fixture
        .engine
        .set_stage_completion(process, "finance", &sign("Bursar"))
        .expect("finance");
    assert_eq!(
        fixture.engine.revoke_stage(process, "finance").expect("revoke"),
        ProcessStatus::Pending
    );

    fixture
        .engine
        .set_stage_completion(process, "finance", &sign("Bursar"))
        .expect("finance");
    fixture
        .engine
        .set_stage_completion(process, "academic", &sign("Academic Registrar"))
        .expect("academic");
    assert!(matches!(
        fixture.engine.revoke_stage(process, "finance"),
        Err(WorkflowError::ProcessFinalized { .. })
    ));
}

#[test]
fn checklist_items_belong_to_registration_and_do_not_affect_status() {
    let fixture = fixture();
    let registration = fixture
        .engine
        .open_registration(&fixture.access_number)
        .expect("open");
    fixture
        .engine
        .set_checklist_item(registration, "undergraduate_gown", true)
        .expect("gown");

    let checklist = fixture.engine.checklist(registration).expect("checklist");
    assert_eq!(checklist.len(), 6);
    assert_eq!(checklist.values().filter(|received| **received).count(), 1);
    assert_eq!(
        fixture.engine.get_status(registration).expect("status"),
        ProcessStatus::Pending
    );

    let clearance = fixture
        .engine
        .open_semester_clearance(&fixture.access_number)
        .expect("clearance");
    assert!(matches!(
        fixture
            .engine
            .set_checklist_item(clearance, "undergraduate_gown", true),
        Err(WorkflowError::WrongKind { .. })
    ));
    assert!(matches!(
        fixture.engine.set_checklist_item(registration, "cape", true),
        Err(WorkflowError::UnknownChecklistItem { .. })
    ));
}

#[test]
fn course_unit_records_open_certification_processes() {
    let fixture = fixture();
    let unit = fixture
        .registry
        .enroll_course_unit(&fixture.access_number, "BAGC1101")
        .expect("enroll");

    let process = fixture.engine.process(unit.certification).expect("process");
    assert_eq!(process.kind, WorkflowKind::Certification);
    assert_eq!(
        fixture
            .engine
            .set_stage_completion(unit.certification, "certifier", &sign("Lecturer"))
            .expect("certify"),
        ProcessStatus::Approved
    );
    assert_eq!(
        fixture
            .registry
            .course_units_for(&fixture.access_number)
            .expect("units")[0]
            .certification,
        unit.certification
    );
}

#[test]
fn unknown_process_is_reported() {
    let fixture = fixture();
    assert!(matches!(
        fixture.engine.get_status(ProcessId(4242)),
        Err(WorkflowError::UnknownProcess { .. })
    ));
}
