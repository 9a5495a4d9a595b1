use crate::app::command_support::{
    parse_date, parse_number, parse_process_id, render_lines, ParsedArgs, Services,
};
use crate::workflow::{
    ApprovalProcess, Attestation, BlockerSource, DeadPeriod, DeadSemesterRequest,
    RegistryBlockerSource, ResumptionRequest,
};

pub fn cmd_process(services: &Services, args: &[String]) -> Result<String, String> {
    let parsed = ParsedArgs::parse(args, &[])?;
    let positional = parsed.positional.as_slice();
    let engine = &services.engine;
    match positional {
        [action, access_number] if action == "open-registration" => engine
            .open_registration(access_number)
            .map(|id| format!("process_id={id}"))
            .map_err(|e| e.to_string()),
        [action] if action == "open-clearance" => {
            let semester = parsed
                .flag("semester")
                .ok_or("usage: process open-clearance <access_number>|--semester <id>")?;
            let created = engine
                .open_semester_clearances_for_semester(parse_number("semester id", semester)?)
                .map_err(|e| e.to_string())?;
            Ok(format!("created_count={created}"))
        }
        [action, access_number] if action == "open-clearance" => engine
            .open_semester_clearance(access_number)
            .map(|id| format!("process_id={id}"))
            .map_err(|e| e.to_string()),
        [action, student_id] if action == "open-graduation" => engine
            .open_graduation(student_id)
            .map(|id| format!("process_id={id}"))
            .map_err(|e| e.to_string()),
        [action, id] if action == "status" => engine
            .get_status(parse_process_id(id)?)
            .map(|status| format!("status={}", status.as_str()))
            .map_err(|e| e.to_string()),
        [action, id] if action == "show" => engine
            .process(parse_process_id(id)?)
            .map(|process| render_process(&process))
            .map_err(|e| e.to_string()),
        _ => Err(
            "usage: process <open-registration|open-clearance|open-graduation|status|show> ..."
                .to_string(),
        ),
    }
}

pub fn cmd_stage(services: &Services, args: &[String]) -> Result<String, String> {
    let parsed = ParsedArgs::parse(args, &[])?;
    match parsed.positional.as_slice() {
        [action, id, stage, officer @ .., date] if action == "set" && !officer.is_empty() => {
            let mut attestation = Attestation::new(officer.join(" "), parse_date("date", date)?);
            if let Some(designation) = parsed.flag("designation") {
                attestation = attestation.with_designation(designation);
            }
            if let Some(department) = parsed.flag("department") {
                attestation = attestation.with_department(department);
            }
            if let Some(signature) = parsed.flag("signature") {
                attestation = attestation.with_signature(signature);
            }
            let status = services
                .engine
                .set_stage_completion(parse_process_id(id)?, stage, &attestation)
                .map_err(|e| e.to_string())?;
            Ok(format!("status={}", status.as_str()))
        }
        [action, id, stage] if action == "revoke" => services
            .engine
            .revoke_stage(parse_process_id(id)?, stage)
            .map(|status| format!("status={}", status.as_str()))
            .map_err(|e| e.to_string()),
        _ => Err("usage: stage <set <process_id> <stage> <officer...> <date>|revoke <process_id> <stage>>".to_string()),
    }
}

pub fn cmd_checklist(services: &Services, args: &[String]) -> Result<String, String> {
    match args {
        [action, id, item] if action == "set" || action == "clear" => {
            services
                .engine
                .set_checklist_item(parse_process_id(id)?, item, action == "set")
                .map_err(|e| e.to_string())?;
            Ok(format!("{item}={}", action == "set"))
        }
        [action, id] if action == "show" => {
            let items = services
                .engine
                .checklist(parse_process_id(id)?)
                .map_err(|e| e.to_string())?;
            Ok(items
                .iter()
                .map(|(item, received)| format!("{}={received}", item.as_str()))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        _ => Err("usage: checklist <set|clear <process_id> <item>|show <process_id>>".to_string()),
    }
}

pub fn cmd_dead_semester(services: &Services, args: &[String]) -> Result<String, String> {
    match args {
        [action, student_id, period, number, date, reason @ ..]
            if action == "file" && !reason.is_empty() =>
        {
            let period = DeadPeriod::parse(period)
                .ok_or_else(|| format!("invalid period `{period}`: expected semester|year"))?;
            let request = DeadSemesterRequest {
                period,
                target_number: parse_number("number", number)?,
                reason: reason.join(" "),
                applied_on: parse_date("date", date)?,
            };
            services
                .engine
                .file_dead_semester_application(student_id, &request)
                .map(|id| format!("process_id={id}"))
                .map_err(|e| e.to_string())
        }
        _ => Err(
            "usage: dead-semester file <student_id> <semester|year> <number> <date> <reason...>"
                .to_string(),
        ),
    }
}

pub fn cmd_resumption(services: &Services, args: &[String]) -> Result<String, String> {
    match args {
        [action, id, semester, year, date, reason @ ..]
            if action == "create" && !reason.is_empty() =>
        {
            let request = ResumptionRequest {
                resume_semester: parse_number("resume semester", semester)?,
                resume_year: parse_number("resume year", year)?,
                reason: reason.join(" "),
                applied_on: parse_date("date", date)?,
            };
            services
                .engine
                .create_resumption_application(parse_process_id(id)?, &request)
                .map(|resumption_id| format!("resumption_id={resumption_id}"))
                .map_err(|e| e.to_string())
        }
        [action, id] if action == "approve" => {
            let resumption_id = parse_number("resumption id", id)?;
            services
                .engine
                .approve_resumption(resumption_id)
                .map_err(|e| e.to_string())?;
            Ok(format!("resumption_id={resumption_id}\napproved=true"))
        }
        _ => Err(
            "usage: resumption <create <process_id> <semester> <year> <date> <reason...>|approve <id>>"
                .to_string(),
        ),
    }
}

pub fn cmd_graduation(services: &Services, args: &[String]) -> Result<String, String> {
    let parsed = ParsedArgs::parse(args, &["skip-blockers"])?;
    match parsed.positional.as_slice() {
        [action, id] if action == "confirm" => {
            let source = RegistryBlockerSource::new(
                services.engine.database().clone(),
                services.settings.graduation.require_internship,
            );
            let blockers: Option<&dyn BlockerSource> = if parsed.switch("skip-blockers") {
                None
            } else {
                Some(&source)
            };
            let status = services
                .engine
                .confirm_graduation_requirements(parse_process_id(id)?, blockers)
                .map_err(|e| e.to_string())?;
            Ok(format!("status={}", status.as_str()))
        }
        _ => Err("usage: graduation confirm <process_id> [--skip-blockers]".to_string()),
    }
}

fn render_process(process: &ApprovalProcess) -> String {
    let mut pairs = vec![
        ("process_id", process.id.to_string()),
        ("kind", process.kind.as_str().to_string()),
        ("subject", process.subject.to_string()),
        ("student_id", process.student_id.clone()),
        ("status", process.status().as_str().to_string()),
    ];
    if let Some(met) = process.requirements_met {
        pairs.push(("requirements_met", met.to_string()));
    }
    let mut out = render_lines(&pairs);
    for record in &process.stages {
        let officer = record.officer_name.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "\nstage.{}={} {officer}",
            record.stage.as_str(),
            if record.completed { "done" } else { "pending" }
        ));
    }
    out
}
