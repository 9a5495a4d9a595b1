use crate::app::command_support::{parse_number, render_lines, ParsedArgs, Services};
use crate::registry::{NewStudent, Session, StudentRecord};

const USAGE: &str = "usage: student <admit|import> <program> <reg_no> <admission_year> <session> <name...> | student show <id>|--reg <reg_no>|--static <code>";

pub fn cmd_student(services: &Services, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some(action @ ("admit" | "import")) if args.len() >= 6 => {
            let session = Session::parse(&args[4])
                .ok_or_else(|| format!("invalid session `{}`: expected day|evening|weekend", args[4]))?;
            let student = NewStudent {
                name: args[5..].join(" "),
                program_code: args[1].clone(),
                admission_year: parse_number("admission year", &args[3])?,
                session,
                registration_number: args[2].clone(),
            };
            let record = if action == "admit" {
                services.registry.admit_student(&student)
            } else {
                services.registry.import_student(&student)
            }
            .map_err(|e| e.to_string())?;
            Ok(render_student(&record))
        }
        Some("show") => {
            let parsed = ParsedArgs::parse(&args[1..], &[])?;
            let record = if let Some(reg) = parsed.flag("reg") {
                services
                    .registry
                    .student_by_registration_number(reg)
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("no student with registration number `{reg}`"))?
            } else if let Some(code) = parsed.flag("static") {
                services
                    .registry
                    .student_by_static_code(code)
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("no student with static code `{code}`"))?
            } else if let [id] = parsed.positional.as_slice() {
                services.registry.student(id).map_err(|e| e.to_string())?
            } else {
                return Err(USAGE.to_string());
            };
            Ok(render_student(&record))
        }
        _ => Err(USAGE.to_string()),
    }
}

fn render_student(record: &StudentRecord) -> String {
    render_lines(&[
        ("student_id", record.id.clone()),
        ("name", record.name.clone()),
        ("registration_number", record.registration_number.clone()),
        ("session", record.session.to_string()),
        (
            "sequence_code",
            record
                .sequence_code
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "none".to_string()),
        ),
        (
            "static_code",
            record.static_code.clone().unwrap_or_else(|| "none".to_string()),
        ),
    ])
}
