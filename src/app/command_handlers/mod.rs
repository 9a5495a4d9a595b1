use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::{load_settings, Services};
use crate::config::Settings;

pub mod access;
pub mod catalog;
pub mod processes;
pub mod setup;
pub mod students;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }
    if parse_cli_verb(args[0].as_str()) == CliVerb::Setup {
        return setup::cmd_setup(&args[1..]);
    }
    let settings = load_settings()?;
    run_cli_with_settings(&settings, args)
}

/// Runs every verb except `setup` against explicit settings.
pub fn run_cli_with_settings(settings: &Settings, args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }
    let verb = parse_cli_verb(args[0].as_str());
    if verb == CliVerb::Unknown {
        return Err(format!("unknown command `{}`", args[0]));
    }
    if verb == CliVerb::Setup {
        return Err("`setup` writes the global config; run it without explicit settings".to_string());
    }

    let services = Services::open(settings)?;
    let rest = &args[1..];
    match verb {
        CliVerb::Program => catalog::cmd_program(&services, rest),
        CliVerb::Course => catalog::cmd_course(&services, rest),
        CliVerb::Year => catalog::cmd_year(&services, rest),
        CliVerb::Semester => catalog::cmd_semester(&services, rest),
        CliVerb::Student => students::cmd_student(&services, rest),
        CliVerb::Access => access::cmd_access(&services, rest),
        CliVerb::Process => processes::cmd_process(&services, rest),
        CliVerb::Stage => processes::cmd_stage(&services, rest),
        CliVerb::Checklist => processes::cmd_checklist(&services, rest),
        CliVerb::DeadSemester => processes::cmd_dead_semester(&services, rest),
        CliVerb::Resumption => processes::cmd_resumption(&services, rest),
        CliVerb::Graduation => processes::cmd_graduation(&services, rest),
        CliVerb::Setup | CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
