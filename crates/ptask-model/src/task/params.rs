use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{ModelError, ModelResult};

/// Task parameters as delivered by the control plane.
///
/// `kind` selects the executor; `payload` belongs to that executor and is never inspected by the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParams {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TaskParams {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Decode the payload into an executor-specific structure.
    pub fn decode<T: DeserializeOwned>(&self) -> ModelResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| ModelError::Params {
            kind: self.kind.clone(),
            reason: e.to_string(),
        })
    }
}
