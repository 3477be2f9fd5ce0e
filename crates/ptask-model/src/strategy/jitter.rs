use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Controls how random jitter is applied to reconcile backoff delays.
///
/// Many agents losing the control plane at the same moment would otherwise come back in lockstep.
///
/// Strategies:
/// - `None`: deterministic delays.
/// - `Full`: uniform in `[0, base]`.
/// - `Equal`: `base/2` plus a uniform share of the other half.
/// - `Decorrelated`: uniform in `[first, prev * 3]`.
///
/// Delays are always clamped back into the configured `[first, max]` window afterwards.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JitterStrategy {
    None,
    Full,
    #[default]
    Equal,
    Decorrelated,
}

impl FromStr for JitterStrategy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(JitterStrategy::None),
            "full" => Ok(JitterStrategy::Full),
            "equal" | "default" => Ok(JitterStrategy::Equal),
            "decorrelated" => Ok(JitterStrategy::Decorrelated),
            other => Err(ModelError::UnknownJitter(other.to_string())),
        }
    }
}
