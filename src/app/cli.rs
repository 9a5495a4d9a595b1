#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Setup,
    Program,
    Course,
    Year,
    Semester,
    Student,
    Access,
    Process,
    Stage,
    Checklist,
    DeadSemester,
    Resumption,
    Graduation,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "setup" => CliVerb::Setup,
        "program" => CliVerb::Program,
        "course" => CliVerb::Course,
        "year" => CliVerb::Year,
        "semester" => CliVerb::Semester,
        "student" => CliVerb::Student,
        "access" => CliVerb::Access,
        "process" => CliVerb::Process,
        "stage" => CliVerb::Stage,
        "checklist" => CliVerb::Checklist,
        "dead-semester" => CliVerb::DeadSemester,
        "resumption" => CliVerb::Resumption,
        "graduation" => CliVerb::Graduation,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  setup [--database <path>] [--log <path>]   Write config and create the database"
            .to_string(),
        "  program add <code> <name>                  Register a program".to_string(),
        "  course add <program> <code> <name> [--inactive]".to_string(),
        "  year add <label> <start> <end>             Dates as YYYY-MM-DD".to_string(),
        "  year activate <id>                         Make one academic year current"
            .to_string(),
        "  semester add <year_id> <number> <start> <end>".to_string(),
        "  semester activate <id>                     Make one semester current".to_string(),
        "  student admit|import <program> <reg_no> <year> <session> <name...>".to_string(),
        "  student show <id> | --reg <reg_no> | --static <code>".to_string(),
        "  access issue <student_id> <year_id> <semester_id> <year_of_study>".to_string(),
        "  access bulk <year_id> <semester_id> <year_of_study> <student_id...>".to_string(),
        "  access deactivate|activate <code>          Toggle an Access Number".to_string(),
        "  access list <student_id>                   List a student's Access Numbers"
            .to_string(),
        "  process open-registration|open-clearance <access_number>".to_string(),
        "  process open-clearance --semester <id>     Open clearances for a whole semester"
            .to_string(),
        "  process open-graduation <student_id>".to_string(),
        "  process status|show <process_id>".to_string(),
        "  stage set <process_id> <stage> <officer> <date> [--designation <d>] [--department <d>] [--signature <ref>]"
            .to_string(),
        "  stage revoke <process_id> <stage>".to_string(),
        "  checklist set|clear <process_id> <item>    Orientation/assimilation items"
            .to_string(),
        "  checklist show <process_id>".to_string(),
        "  dead-semester file <student_id> <semester|year> <number> <date> <reason...>"
            .to_string(),
        "  resumption create <process_id> <semester> <year> <date> <reason...>".to_string(),
        "  resumption approve <id>".to_string(),
        "  graduation confirm <process_id> [--skip-blockers]".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_and_unknown_falls_through() {
        assert_eq!(parse_cli_verb("access"), CliVerb::Access);
        assert_eq!(parse_cli_verb("dead-semester"), CliVerb::DeadSemester);
        assert_eq!(parse_cli_verb("dead_semester"), CliVerb::Unknown);
    }
}
