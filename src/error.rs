//! Error taxonomy for pipeline assembly and execution.
//!
//! Construction errors (invalid conf, unknown builder/handler, malformed
//! assembly JSON) abort assembly; no Line is ever built partially. Runtime
//! errors travel as [HandleFailure] so the caller gets both the error and the
//! result snapshot that was current when the failure occurred.

use thiserror::Error;

use crate::types::{HandleResult, HandleStatus};

/// All error kinds produced by assembly and execution.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// A registered builder was found but failed to build its handler.
  #[error("build handler failed: {name}: {cause}")]
  BuildHandlerFailed { name: String, cause: String },

  /// `ref_handler_id` did not resolve against the supplied handler map.
  #[error("ref handler not found: {0}")]
  RefHandlerNotFound(String),

  /// `handler_builder_name` did not resolve against the registry.
  #[error("handler builder not found: {0}")]
  HandlerBuilderNotFound(String),

  /// A handler returned an error before its timeout.
  #[error("handle failed: {0}")]
  HandleFailed(String),

  /// The timeout elapsed before the handler returned.
  #[error("{desc}: handle timeout within {timeout_ms}ms")]
  HandleTimeout { desc: String, timeout_ms: i64 },

  /// Pipe conf carried a non-positive timeout.
  #[error("timeout less than or equal to 0")]
  TimeoutInvalid,

  /// Pipe conf was non-required but carried no default data.
  #[error("non-required pipe needs default data")]
  MissingDefaultData,

  /// Malformed assembly JSON or unsupported nesting (array-of-array).
  #[error("invalid pipeline conf: {0}")]
  AssemblyFormat(String),

  /// A builder rejected its own conf (malformed JSON, failed field check).
  #[error("invalid handler conf: {0}")]
  HandlerConfInvalid(String),
}

impl PipelineError {
  /// Whether this error is a timeout, for status derivation.
  pub fn is_timeout(&self) -> bool {
    matches!(self, PipelineError::HandleTimeout { .. })
  }
}

/// Fatal handle failure: the error plus the result snapshot for the caller.
///
/// The snapshot carries the derived status and the error message; its payload
/// is whatever was salvageable (usually [serde_json::Value::Null], or the
/// partially-aggregated array for a parallel failure).
#[derive(Debug, Error)]
#[error("{source}")]
pub struct HandleFailure {
  pub result: HandleResult,
  #[source]
  pub source: PipelineError,
}

impl HandleFailure {
  /// Pairs an explicit result snapshot with the error.
  pub fn with_result(result: HandleResult, source: PipelineError) -> Self {
    Self { result, source }
  }
}

/// Fatal failure during verbose line execution: the error plus the ordered
/// step log collected so far, the failing step's snapshot included.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct VerboseFailure {
  pub log: Vec<HandleResult>,
  #[source]
  pub source: PipelineError,
}

impl From<PipelineError> for HandleFailure {
  /// Builds a snapshot from the error alone: Timeout status for a timeout,
  /// Failed otherwise, message from the error display.
  fn from(source: PipelineError) -> Self {
    let status = if source.is_timeout() {
      HandleStatus::Timeout
    } else {
      HandleStatus::Failed
    };
    let result = HandleResult {
      status,
      message: source.to_string(),
      ..HandleResult::default()
    };
    Self { result, source }
  }
}
