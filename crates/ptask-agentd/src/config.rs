use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use ptask_core::WorkerConfig;
use ptask_observe::LoggerConfig;

use crate::error::AgentError;

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "PTASK_CONFIG";
/// Env var overriding the configured log level.
pub const LOG_ENV: &str = "PTASK_LOG";

const DEFAULT_CONFIG_PATH: &str = "ptask.json";
const DEFAULT_ASSIGNMENTS_PATH: &str = "assignments.json";

/// Agent configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub worker: WorkerConfig,
    pub logger: LoggerConfig,
    /// File read by the local control plane on every reconcile pass.
    pub assignments_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            logger: LoggerConfig::default(),
            assignments_path: PathBuf::from(DEFAULT_ASSIGNMENTS_PATH),
        }
    }
}

impl AgentConfig {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(AgentError::ReadConfig {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&raw).map_err(|source| AgentError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Config path: `$PTASK_CONFIG`, else the first CLI argument, else `ptask.json`.
pub fn config_path() -> PathBuf {
    resolve_path(std::env::var(CONFIG_ENV).ok(), std::env::args().nth(1))
}

fn resolve_path(from_env: Option<String>, from_args: Option<String>) -> PathBuf {
    from_env
        .filter(|p| !p.trim().is_empty())
        .or(from_args)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
