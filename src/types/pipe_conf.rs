//! Validated descriptor of one pipeline step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;

/// Conf for one single pipe: policy fields plus exactly one way to obtain the
/// handler (an existing handler id, or a builder name + builder conf).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConf {
  /// Human-readable step description, used in timeout errors and logs.
  pub desc: String,
  /// Per-step timeout in milliseconds. Must be positive.
  pub timeout: i64,
  /// Whether a failure or timeout of this step is fatal to the enclosing
  /// line or parallel group.
  pub required: bool,
  /// Fallback payload for a non-required step that fails or times out.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_data: Option<Value>,
  /// Id of an existing handler to use as-is. Checked before the builder.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ref_handler_id: Option<String>,
  /// Name of a registered builder to construct the handler on the spot.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub handler_builder_name: Option<String>,
  /// Conf blob handed to the builder.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub handler_builder_conf: Option<Value>,
}

impl PipeConf {
  /// Checks the policy invariants. Pure; called once at construction time,
  /// so a pipe is never built from an unvalidated conf.
  pub fn validate(&self) -> Result<(), PipelineError> {
    if self.timeout <= 0 {
      return Err(PipelineError::TimeoutInvalid);
    }
    if !self.required && self.default_data.is_none() {
      return Err(PipelineError::MissingDefaultData);
    }
    Ok(())
  }
}
