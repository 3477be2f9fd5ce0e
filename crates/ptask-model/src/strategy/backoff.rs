use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Normal reconcile cadence: 4 minutes.
const DEFAULT_FIRST_MS: u64 = 4 * 60 * 1_000;
/// Slowest reconcile cadence after repeated failures: 14 minutes.
const DEFAULT_MAX_MS: u64 = 14 * 60 * 1_000;

/// Delay window for the assignment reconcile loop.
///
/// `first_ms` is both the normal cadence and the delay after a success;
/// consecutive failures multiply it by `factor` until `max_ms` is reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffStrategy {
    pub jitter: super::JitterStrategy,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            jitter: super::JitterStrategy::default(),
            first_ms: DEFAULT_FIRST_MS,
            max_ms: DEFAULT_MAX_MS,
            factor: 2.0,
        }
    }
}

impl BackoffStrategy {
    /// Check the window is usable.
    ///
    /// Rules:
    /// - `first_ms > 0`;
    /// - `max_ms >= first_ms`;
    /// - `factor >= 1.0` and finite.
    pub fn validate(&self) -> ModelResult<()> {
        if self.first_ms == 0 {
            return Err(ModelError::InvalidBackoff("firstMs must be positive".into()));
        }
        if self.max_ms < self.first_ms {
            return Err(ModelError::InvalidBackoff(format!(
                "maxMs ({}) is below firstMs ({})",
                self.max_ms, self.first_ms
            )));
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ModelError::InvalidBackoff(format!(
                "factor must be >= 1.0, got {}",
                self.factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JitterStrategy;

    #[test]
    fn default_window_is_four_to_fourteen_minutes() {
        let b = BackoffStrategy::default();
        assert_eq!(b.first_ms, 240_000);
        assert_eq!(b.max_ms, 840_000);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_windows() {
        let zero = BackoffStrategy {
            first_ms: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let inverted = BackoffStrategy {
            first_ms: 10,
            max_ms: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let shrinking = BackoffStrategy {
            factor: 0.5,
            ..Default::default()
        };
        assert!(shrinking.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let b: BackoffStrategy =
            serde_json::from_str(r#"{"firstMs": 1000, "jitter": "none"}"#).unwrap();
        assert_eq!(b.first_ms, 1_000);
        assert_eq!(b.max_ms, DEFAULT_MAX_MS);
        assert_eq!(b.jitter, JitterStrategy::None);
    }
}
