use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use super::LoggerError;

const DEFAULT_LEVEL: &str = "info";

/// A validated `EnvFilter` expression such as `"info"` or `"ptask_core=debug,info"`.
///
/// This type lives at the configuration layer:
/// - it keeps the raw filter string, so it round-trips through config files unchanged;
/// - it is validated with `EnvFilter::try_new` whenever it is built or deserialized;
/// - it turns into a real `EnvFilter` only when the logger is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// Validate and wrap a filter expression.
    ///
    /// # Examples
    /// ```
    /// use ptask_observe::LoggerLevel;
    ///
    /// let lvl = LoggerLevel::new("ptask_core=debug,info").unwrap();
    /// assert_eq!(lvl.as_str(), "ptask_core=debug,info");
    ///
    /// assert!(LoggerLevel::new("ptask_core=loud").is_err());
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(s.into())
    }

    /// The expression exactly as configured.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the filter. The expression was validated on construction.
    ///
    /// # Examples
    /// ```
    /// use ptask_observe::LoggerLevel;
    ///
    /// let lvl: LoggerLevel = "ptask_exec=trace,warn".parse().unwrap();
    /// let _filter = lvl.to_env_filter();
    /// ```
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.as_str()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        LoggerLevel(DEFAULT_LEVEL.to_string())
    }
}

impl fmt::Display for LoggerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match EnvFilter::try_new(&s) {
            Ok(_) => Ok(LoggerLevel(s)),
            Err(e) => Err(LoggerError::InvalidLevel(format!("{s}: {e}"))),
        }
    }
}

impl From<LoggerLevel> for String {
    fn from(l: LoggerLevel) -> Self {
        l.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_directives() {
        for lvl in ["info", "trace", "ptask_core=debug,info", "ptask_exec=trace,warn"] {
            assert!(lvl.parse::<LoggerLevel>().is_ok(), "{lvl} should parse");
        }
    }

    #[test]
    fn rejects_bad_directives() {
        for lvl in ["ptask_core=loud", "a=trace,b=wat"] {
            assert!(matches!(
                lvl.parse::<LoggerLevel>(),
                Err(LoggerError::InvalidLevel(_))
            ));
        }
    }

    #[test]
    fn deserialization_validates() {
        let lvl: LoggerLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(lvl.as_str(), "debug");
        assert!(serde_json::from_str::<LoggerLevel>(r#""core=nope""#).is_err());
    }

    #[test]
    fn default_is_info() {
        assert_eq!(LoggerLevel::default().as_str(), "info");
        let _ = LoggerLevel::default().to_env_filter();
    }
}
