use crate::config::{load_global_settings, ConfigError, Settings};
use crate::registry::Registry;
use crate::shared::EventLog;
use crate::store::Database;
use crate::workflow::{ProcessId, WorkflowEngine};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn load_settings() -> Result<Settings, String> {
    load_global_settings().map_err(map_config_err)
}

/// Registry and workflow engine sharing one database handle.
pub struct Services {
    pub settings: Settings,
    pub registry: Registry,
    pub engine: WorkflowEngine,
}

impl Services {
    pub fn open(settings: &Settings) -> Result<Self, String> {
        settings.validate().map_err(map_config_err)?;
        let db = Database::open(&settings.database_path, settings.allocation.busy_timeout())
            .map_err(|e| e.to_string())?;
        let log = EventLog::from_optional(settings.log_path.as_deref());
        Ok(Self {
            settings: settings.clone(),
            registry: Registry::new(db.clone(), settings.allocation.clone(), log.clone()),
            engine: WorkflowEngine::new(db, log),
        })
    }
}

/// Splits `--flag value` pairs (and bare `--switch`es listed in `switches`)
/// from positional arguments.
pub struct ParsedArgs {
    pub positional: Vec<String>,
    pub flags: BTreeMap<String, String>,
}

impl ParsedArgs {
    pub fn parse(args: &[String], switches: &[&str]) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut flags = BTreeMap::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                positional.push(arg.clone());
                continue;
            };
            if switches.contains(&name) {
                flags.insert(name.to_string(), "true".to_string());
                continue;
            }
            let value = iter
                .next()
                .ok_or_else(|| format!("flag `--{name}` requires a value"))?;
            flags.insert(name.to_string(), value.clone());
        }
        Ok(Self { positional, flags })
    }

    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }

    pub fn switch(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }
}

pub fn parse_number<T>(field: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| format!("invalid {field} `{raw}`: {e}"))
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid {field} `{raw}`: expected YYYY-MM-DD"))
}

pub fn parse_process_id(raw: &str) -> Result<ProcessId, String> {
    ProcessId::parse(raw)
}

pub fn render_lines(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
