use crate::app::command_support::{parse_date, parse_number, render_lines, ParsedArgs, Services};

pub fn cmd_program(services: &Services, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("add") if args.len() >= 4 => {
            let program = services
                .registry
                .create_program(&args[1], &args[2..].join(" "))
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("program_id", program.id.to_string()),
                ("code", program.code),
            ]))
        }
        _ => Err("usage: program add <code> <name>".to_string()),
    }
}

pub fn cmd_course(services: &Services, args: &[String]) -> Result<String, String> {
    let parsed = ParsedArgs::parse(args, &["inactive"])?;
    match parsed.positional.first().map(String::as_str) {
        Some("add") if parsed.positional.len() >= 4 => {
            let course = services
                .registry
                .create_course(
                    &parsed.positional[1],
                    &parsed.positional[2],
                    &parsed.positional[3..].join(" "),
                    !parsed.switch("inactive"),
                )
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("course_id", course.id.to_string()),
                ("code", course.code),
                ("active", course.is_active.to_string()),
            ]))
        }
        _ => Err("usage: course add <program_code> <code> <name> [--inactive]".to_string()),
    }
}

pub fn cmd_year(services: &Services, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("add") if args.len() == 4 => {
            let year = services
                .registry
                .create_academic_year(
                    &args[1],
                    parse_date("start date", &args[2])?,
                    parse_date("end date", &args[3])?,
                )
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("academic_year_id", year.id.to_string()),
                ("label", year.label),
            ]))
        }
        Some("activate") if args.len() == 2 => {
            let year = services
                .registry
                .set_active_academic_year(parse_number("academic year id", &args[1])?)
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("academic_year_id", year.id.to_string()),
                ("active", year.is_active.to_string()),
            ]))
        }
        _ => Err("usage: year <add <label> <start> <end>|activate <id>>".to_string()),
    }
}

pub fn cmd_semester(services: &Services, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("add") if args.len() == 5 => {
            let semester = services
                .registry
                .create_semester(
                    parse_number("academic year id", &args[1])?,
                    parse_number("semester number", &args[2])?,
                    parse_date("start date", &args[3])?,
                    parse_date("end date", &args[4])?,
                )
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("semester_id", semester.id.to_string()),
                ("short_code", semester.short_code()),
            ]))
        }
        Some("activate") if args.len() == 2 => {
            let semester = services
                .registry
                .set_active_semester(parse_number("semester id", &args[1])?)
                .map_err(|e| e.to_string())?;
            Ok(render_lines(&[
                ("semester_id", semester.id.to_string()),
                ("active", semester.is_active.to_string()),
            ]))
        }
        _ => Err(
            "usage: semester <add <year_id> <number> <start> <end>|activate <id>>".to_string(),
        ),
    }
}
