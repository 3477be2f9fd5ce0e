use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use super::{LoggerError, LoggerFormat, LoggerLevel};

/// Logger configuration, usually the `logger` section of the agent config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression (e.g. `"info"`, `"ptask_core=debug,info"`).
    pub level: LoggerLevel,
    /// Include module/target names.
    pub with_targets: bool,
    /// Colored output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    #[inline]
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }

    /// Replace the level with `value` when present, e.g. from an environment variable.
    ///
    /// An invalid override is an error rather than silently ignored.
    pub fn with_level_override(mut self, value: Option<&str>) -> Result<Self, LoggerError> {
        if let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.level = raw.parse()?;
        }
        Ok(self)
    }
}
