use crate::app::command_support::{parse_number, render_lines, Services};
use crate::registry::{AccessNumberRequest, SemesterIdentifier};

const USAGE: &str = "usage: access <issue <student_id> <year_id> <semester_id> <year_of_study>|bulk <year_id> <semester_id> <year_of_study> <student_id...>|deactivate <code>|activate <code>|list <student_id>>";

pub fn cmd_access(services: &Services, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("issue") if args.len() == 5 => {
            let request = parse_request(&args[2], &args[3], &args[4])?;
            let issued = services
                .registry
                .issue_access_number(&args[1], request)
                .map_err(|e| e.to_string())?;
            Ok(render_identifier(&issued))
        }
        Some("bulk") if args.len() >= 5 => {
            let request = parse_request(&args[1], &args[2], &args[3])?;
            let outcomes = services
                .registry
                .bulk_issue_access_numbers(&args[4..], request)
                .map_err(|e| e.to_string())?;
            let issued = outcomes.iter().filter(|item| item.result.is_ok()).count();
            let mut lines = vec![format!("issued_count={issued}")];
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(identifier) => {
                        lines.push(format!("{}={}", outcome.student_id, identifier.code))
                    }
                    Err(err) => lines.push(format!("{}=error: {err}", outcome.student_id)),
                }
            }
            Ok(lines.join("\n"))
        }
        Some("deactivate") if args.len() == 2 => services
            .registry
            .deactivate_access_number(&args[1])
            .map(|identifier| render_identifier(&identifier))
            .map_err(|e| e.to_string()),
        Some("activate") if args.len() == 2 => services
            .registry
            .reactivate_access_number(&args[1])
            .map(|identifier| render_identifier(&identifier))
            .map_err(|e| e.to_string()),
        Some("list") if args.len() == 2 => {
            let identifiers = services
                .registry
                .access_numbers_for_student(&args[1])
                .map_err(|e| e.to_string())?;
            Ok(identifiers
                .iter()
                .map(|identifier| {
                    let state = if identifier.is_active { "active" } else { "inactive" };
                    format!("{} {state}", identifier.code)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        _ => Err(USAGE.to_string()),
    }
}

fn parse_request(
    year_id: &str,
    semester_id: &str,
    year_of_study: &str,
) -> Result<AccessNumberRequest, String> {
    Ok(AccessNumberRequest {
        academic_year_id: parse_number("academic year id", year_id)?,
        semester_id: parse_number("semester id", semester_id)?,
        year_of_study: parse_number("year of study", year_of_study)?,
    })
}

fn render_identifier(identifier: &SemesterIdentifier) -> String {
    render_lines(&[
        ("access_number", identifier.code.clone()),
        ("student_id", identifier.student_id.clone()),
        ("active", identifier.is_active.to_string()),
    ])
}
