//! Engine settings sourced from the environment.

use std::{env, time::Duration};

use thiserror::Error;

/// Environment variable overriding the command timeout (`"90"`, `"90s"`, `"10m"`).
pub const COMMAND_TIMEOUT_ENV: &str = "FORGE_COMMAND_TIMEOUT";

/// Upper bound on how long a single `exec` step may run.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid timeout '{value}': expected seconds (\"90\", \"90s\") or minutes (\"10m\") greater than zero")]
    InvalidTimeout { value: String },
}

/// Settings applied when the engine builds its default collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Deadline for each external command; exceeding it kills the process.
    pub command_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl EngineSettings {
    /// Builds settings from defaults overridden by `FORGE_COMMAND_TIMEOUT`.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Ok(value) = env::var(COMMAND_TIMEOUT_ENV)
            && !value.trim().is_empty()
        {
            settings.command_timeout = parse_duration(&value)?;
        }
        Ok(settings)
    }

    /// Returns a copy with the given command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Parses `"10s"`, `"2m"`, or a bare number of seconds.
pub fn parse_duration(text: &str) -> Result<Duration, SettingsError> {
    let invalid = || SettingsError::InvalidTimeout { value: text.to_string() };
    let trimmed = text.trim();
    let last = trimmed.chars().last().ok_or_else(invalid)?;

    let duration = if last.is_ascii_alphabetic() {
        let amount: u64 = trimmed[..trimmed.len() - 1].trim().parse().map_err(|_| invalid())?;
        match last {
            's' | 'S' => Duration::from_secs(amount),
            'm' | 'M' => Duration::from_secs(amount.checked_mul(60).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        }
    } else {
        Duration::from_secs(trimmed.parse().map_err(|_| invalid())?)
    };

    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}
