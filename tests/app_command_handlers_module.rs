use passbook::app::command_handlers::{run_cli, run_cli_with_settings};
use passbook::config::Settings;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn run(settings: &Settings, args: &[&str]) -> Result<String, String> {
    run_cli_with_settings(settings, args.iter().map(|arg| arg.to_string()).collect())
}

fn fields(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn empty_invocation_prints_help() {
    let help = run_cli(Vec::new()).expect("help");
    assert!(help.contains("access bulk"));
    assert!(help.contains("graduation confirm"));
}

#[test]
fn unknown_command_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::for_database(dir.path().join("passbook.db"));
    let err = run(&settings, &["enrol"]).expect_err("unknown");
    assert_eq!(err, "unknown command `enrol`");
}

#[test]
fn relative_database_path_is_rejected() {
    let settings = Settings::for_database("passbook.db");
    let err = run(&settings, &["program", "add", "BAGC", "Guidance"]).expect_err("relative");
    assert!(err.contains("database_path"));
}

#[test]
fn admission_to_graduation_through_the_cli() {
    let dir = tempdir().expect("tempdir");
    let mut settings = Settings::for_database(dir.path().join("passbook.db"));
    settings.graduation.require_internship = false;

    run(&settings, &["program", "add", "BAGC", "Bachelor", "of", "Guidance"]).expect("program");
    run(&settings, &["course", "add", "BAGC", "BAGC", "Guidance"]).expect("course");
    let year = fields(
        &run(&settings, &["year", "add", "2024/2025", "2024-08-01", "2025-07-31"]).expect("year"),
    );
    let year_id = &year["academic_year_id"];
    let semester = fields(
        &run(
            &settings,
            &["semester", "add", year_id, "1", "2024-08-01", "2024-12-20"],
        )
        .expect("semester"),
    );
    assert_eq!(semester["short_code"], "S1");
    let semester_id = &semester["semester_id"];

    let admitted = fields(
        &run(
            &settings,
            &["student", "admit", "BAGC", "R1", "2024", "day", "Amina", "Nakato"],
        )
        .expect("admit"),
    );
    assert_eq!(admitted["static_code"], "BAGC-AA01");
    assert_eq!(admitted["name"], "Amina Nakato");
    let student_id = &admitted["student_id"];

    let bulk = run(
        &settings,
        &["access", "bulk", year_id, semester_id, "1", student_id],
    )
    .expect("bulk");
    let bulk = fields(&bulk);
    assert_eq!(bulk["issued_count"], "1");
    assert_eq!(bulk[student_id.as_str()], "BAGC-S1-AA01");

    let clearance = fields(
        &run(&settings, &["process", "open-clearance", "--semester", semester_id])
            .expect("open clearances"),
    );
    assert_eq!(clearance["created_count"], "1");

    let graduation = fields(
        &run(&settings, &["process", "open-graduation", student_id]).expect("graduation"),
    );
    let process_id = &graduation["process_id"];
    let signed = run(
        &settings,
        &[
            "stage",
            "set",
            process_id,
            "approving_officer",
            "Prof.",
            "Okello",
            "2025-06-01",
            "--designation",
            "Dean",
        ],
    )
    .expect("sign");
    assert_eq!(signed, "status=PARTIAL");

    let confirmed = run(&settings, &["graduation", "confirm", process_id]).expect("confirm");
    assert_eq!(confirmed, "status=APPROVED");

    let shown = run(&settings, &["process", "show", process_id]).expect("show");
    assert!(shown.contains("stage.approving_officer=done Prof. Okello"));
    assert!(shown.contains("requirements_met=true"));
}

#[test]
fn resumption_before_approval_is_refused() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::for_database(dir.path().join("passbook.db"));
    run(&settings, &["program", "add", "BAGC", "Guidance"]).expect("program");
    let admitted = fields(
        &run(
            &settings,
            &["student", "admit", "BAGC", "R1", "2024", "evening", "Amina"],
        )
        .expect("admit"),
    );
    let filed = fields(
        &run(
            &settings,
            &[
                "dead-semester",
                "file",
                &admitted["student_id"],
                "semester",
                "1",
                "2024-09-01",
                "medical",
                "leave",
            ],
        )
        .expect("file"),
    );
    let err = run(
        &settings,
        &[
            "resumption",
            "create",
            &filed["process_id"],
            "1",
            "2",
            "2025-08-01",
            "recovered",
        ],
    )
    .expect_err("not approved");
    assert!(err.contains("PENDING"), "{err}");
}
