use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the allocator does when the stored last-issued code cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedCodePolicy {
    /// Abort the allocation and report the corrupt value.
    #[default]
    Reject,
    /// Log a warning and reseed from the highest code held by a student,
    /// or `AA01` when none is held.
    Restart,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    25
}

fn default_busy_timeout_ms() -> u64 {
    2_000
}

fn default_require_internship() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub malformed_code_policy: MalformedCodePolicy,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            malformed_code_policy: MalformedCodePolicy::default(),
        }
    }
}

impl AllocationConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Linear backoff before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraduationConfig {
    #[serde(default = "default_require_internship")]
    pub require_internship: bool,
}

impl Default for GraduationConfig {
    fn default() -> Self {
        Self {
            require_internship: default_require_internship(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database_path: PathBuf,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub graduation: GraduationConfig,
}

impl Settings {
    pub fn for_database(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            log_path: None,
            allocation: AllocationConfig::default(),
            graduation: GraduationConfig::default(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.database_path.is_absolute() {
            return Err(ConfigError::Settings(
                "`database_path` must be an absolute path".to_string(),
            ));
        }
        if let Some(log_path) = &self.log_path {
            if !log_path.is_absolute() {
                return Err(ConfigError::Settings(
                    "`log_path` must be an absolute path when provided".to_string(),
                ));
            }
        }
        if self.allocation.max_attempts == 0 {
            return Err(ConfigError::Settings(
                "`allocation.max_attempts` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
