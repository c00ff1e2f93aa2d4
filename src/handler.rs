//! The Handler capability and its named-factory counterpart.
//!
//! A [Handler] consumes a [HandleResult] (payload + meta context) and
//! produces a new one, or fails. Concrete step implementations (expression
//! evaluation, JSON extraction, future additions) plug in through exactly
//! this contract; the engine never knows their internals.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HandleFailure, PipelineError};
use crate::types::HandleResult;

/// A map of pre-built handlers, resolvable by id from a pipe conf.
pub type HandlerMap = HashMap<String, Arc<dyn Handler>>;

/// A unit of computation: input value + params in, output value + params out,
/// or failure. Status stamping is the enclosing pipe's job; a handler should
/// leave `status` alone.
#[async_trait]
pub trait Handler: Send + Sync {
  async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure>;
}

impl std::fmt::Debug for dyn Handler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("dyn Handler")
  }
}

/// Adapter to use a plain async closure as a [Handler]:
/// `HandlerFn::new(|req| async move { .. })`.
pub struct HandlerFn<F>(F);

impl<F> HandlerFn<F> {
  pub fn new(f: F) -> Self {
    Self(f)
  }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
  F: Fn(HandleResult) -> Fut + Send + Sync,
  Fut: Future<Output = Result<HandleResult, HandleFailure>> + Send,
{
  async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    (self.0)(req).await
  }
}

/// Named factory that constructs a [Handler] from a JSON conf blob at
/// assembly time. Registered under a process-wide string name in a
/// [crate::registry::BuilderRegistry].
pub trait HandlerBuilder: Send + Sync {
  /// Builds a handler. `id` identifies the owning step for log context;
  /// `conf` is the raw `handler_builder_conf` value from the pipe conf.
  fn build(&self, id: &str, conf: &Value) -> Result<Arc<dyn Handler>, PipelineError>;
}

/// Adapter to use a plain function as a [HandlerBuilder].
pub struct BuilderFn<F>(F);

impl<F> BuilderFn<F> {
  pub fn new(f: F) -> Self {
    Self(f)
  }
}

impl<F> HandlerBuilder for BuilderFn<F>
where
  F: Fn(&str, &Value) -> Result<Arc<dyn Handler>, PipelineError> + Send + Sync,
{
  fn build(&self, id: &str, conf: &Value) -> Result<Arc<dyn Handler>, PipelineError> {
    (self.0)(id, conf)
  }
}
