//! The canonical unit of success and failure reporting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ParamMap;

/// Outcome status of one pipe invocation. Always computed by the pipe from
/// the timeout race, never guessed by the handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
  /// Handler returned without error before the timeout.
  #[default]
  Ok,
  /// The timeout elapsed before the handler returned.
  Timeout,
  /// Handler returned an error before the timeout.
  Failed,
}

/// Input/output of every handler invocation and every pipe.
///
/// Immutable once returned to the caller. `Clone` is the deep-copy operation
/// used for verbose-log snapshots: `serde_json::Value` and the meta map clone
/// with no shared mutable sub-structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleResult {
  pub status: HandleStatus,
  pub message: String,
  pub meta: ParamMap,
  pub data: Value,
}

impl HandleResult {
  /// A result carrying only a payload, the usual shape of a line's input.
  pub fn with_data(data: Value) -> Self {
    Self {
      data,
      ..Self::default()
    }
  }

  /// A result carrying a payload plus meta context.
  pub fn new(data: Value, meta: ParamMap) -> Self {
    Self {
      data,
      meta,
      ..Self::default()
    }
  }
}
