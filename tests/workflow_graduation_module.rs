use chrono::NaiveDate;
use passbook::config::Settings;
use passbook::registry::{
    AccessNumberRequest, CourseUnitStatus, InternshipStatus, NewStudent, Registry, Session,
};
use passbook::workflow::{
    Attestation, Blocker, BlockerSource, ProcessStatus, RegistryBlockerSource, WorkflowEngine,
    WorkflowError,
};
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    registry: Registry,
    engine: WorkflowEngine,
    student_id: String,
    access_number: String,
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
        .create_academic_year("2026/2027", date("2026-08-01"), date("2027-07-31"))
        .expect("year");
    let semester = registry
        .create_semester(year.id, 2, date("2027-01-10"), date("2027-05-30"))
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
                year_of_study: 3,
            },
        )
        .expect("issue");
    Fixture {
        _dir: dir,
        registry,
        engine,
        student_id: student.id,
        access_number: issued.code,
    }
}

struct NoBlockers;

impl BlockerSource for NoBlockers {
    fn outstanding_blockers(&self, _student_id: &str) -> Result<Vec<Blocker>, WorkflowError> {
        Ok(Vec::new())
    }
}

struct AlwaysBlocked;

impl BlockerSource for AlwaysBlocked {
    fn outstanding_blockers(&self, _student_id: &str) -> Result<Vec<Blocker>, WorkflowError> {
        Ok(vec![Blocker::InternshipIncomplete])
    }
}

#[test]
fn graduation_needs_signature_and_requirements_gate() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_graduation(&fixture.student_id)
        .expect("open");
    assert_eq!(
        fixture
            .engine
            .set_stage_completion(
                process,
                "approving_officer",
                &Attestation::new("Dean", date("2027-06-01"))
            )
            .expect("sign"),
        ProcessStatus::Partial
    );
    assert_eq!(
        fixture
            .engine
            .confirm_graduation_requirements(process, Some(&NoBlockers))
            .expect("confirm"),
        ProcessStatus::Approved
    );
}

#[test]
fn confirming_first_leaves_process_partial() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_graduation(&fixture.student_id)
        .expect("open");
    assert_eq!(
        fixture
            .engine
            .confirm_graduation_requirements(process, None)
            .expect("confirm"),
        ProcessStatus::Partial
    );
    assert_eq!(
        fixture.engine.process(process).expect("process").requirements_met,
        Some(true)
    );
}

#[test]
fn blockers_keep_the_gate_closed() {
    let fixture = fixture();
    let process = fixture
        .engine
        .open_graduation(&fixture.student_id)
        .expect("open");
    match fixture
        .engine
        .confirm_graduation_requirements(process, Some(&AlwaysBlocked))
    {
        Err(WorkflowError::OutstandingBlockers { blockers, .. }) => {
            assert_eq!(blockers, vec![Blocker::InternshipIncomplete])
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(
        fixture.engine.process(process).expect("process").requirements_met,
        Some(false)
    );
}

#[test]
fn registry_source_reports_missed_units_and_missing_internship() {
    let fixture = fixture();
    let unit = fixture
        .registry
        .enroll_course_unit(&fixture.access_number, "BAGC3201")
        .expect("enroll");
    fixture
        .registry
        .set_course_unit_status(unit.id, CourseUnitStatus::Retake)
        .expect("retake");
    let source = RegistryBlockerSource::new(fixture.registry.database().clone(), true);

    let blockers = source
        .outstanding_blockers(&fixture.student_id)
        .expect("blockers");
    assert_eq!(
        blockers,
        vec![
            Blocker::CourseUnit {
                access_number: fixture.access_number.clone(),
                course_unit_code: "BAGC3201".to_string(),
                status: "retake".to_string(),
            },
            Blocker::InternshipIncomplete,
        ]
    );

    fixture
        .registry
        .set_course_unit_status(unit.id, CourseUnitStatus::Passed)
        .expect("passed");
    fixture
        .registry
        .record_internship(
            &fixture.access_number,
            InternshipStatus::Done,
            Some("Mulago Hospital"),
            None,
        )
        .expect("internship");
    assert!(source
        .outstanding_blockers(&fixture.student_id)
        .expect("blockers")
        .is_empty());

    let process = fixture
        .engine
        .open_graduation(&fixture.student_id)
        .expect("open");
    fixture
        .engine
        .confirm_graduation_requirements(process, Some(&source))
        .expect("gate opens");
}

#[test]
fn internship_requirement_can_be_disabled() {
    let fixture = fixture();
    let source = RegistryBlockerSource::new(fixture.registry.database().clone(), false);
    assert!(source
        .outstanding_blockers(&fixture.student_id)
        .expect("blockers")
        .is_empty());
}

#[test]
fn confirm_on_non_graduation_process_is_wrong_kind() {
    let fixture = fixture();
    let clearance = fixture
        .engine
        .open_semester_clearance(&fixture.access_number)
        .expect("clearance");
    assert!(matches!(
        fixture.engine.confirm_graduation_requirements(clearance, None),
        Err(WorkflowError::WrongKind { .. })
    ));
}
