use crate::app::command_support::{map_config_err, render_lines, ParsedArgs};
use crate::config::{default_global_config_path, default_state_root, save_settings, Settings};
use crate::store::Database;
use std::path::PathBuf;

pub fn cmd_setup(args: &[String]) -> Result<String, String> {
    let parsed = ParsedArgs::parse(args, &[])?;
    if !parsed.positional.is_empty() {
        return Err("usage: setup [--database <path>] [--log <path>]".to_string());
    }
    let config_path = default_global_config_path().map_err(map_config_err)?;
    let state_root = default_state_root().map_err(map_config_err)?;

    let database_path = parsed
        .flag("database")
        .map(PathBuf::from)
        .unwrap_or_else(|| state_root.join("passbook.db"));
    let mut settings = Settings::for_database(database_path);
    settings.log_path = Some(
        parsed
            .flag("log")
            .map(PathBuf::from)
            .unwrap_or_else(|| state_root.join("logs/events.jsonl")),
    );
    save_settings(&config_path, &settings).map_err(map_config_err)?;

    let db = Database::open(&settings.database_path, settings.allocation.busy_timeout())
        .map_err(|e| e.to_string())?;
    Ok(render_lines(&[
        ("config", config_path.display().to_string()),
        ("database", db.path().display().to_string()),
    ]))
}
