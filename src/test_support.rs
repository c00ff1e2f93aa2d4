//! Shared fixtures for engine tests: a small registry of delay/fail builders
//! and a handler map with the handlers the assembly tests reference by id.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{HandleFailure, PipelineError};
use crate::handler::{BuilderFn, Handler, HandlerBuilder, HandlerFn, HandlerMap};
use crate::registry::BuilderRegistry;
use crate::types::HandleResult;

/// Sleeps for the given duration, then echoes the request.
pub(crate) fn delay_handler(delay: Duration) -> Arc<dyn Handler> {
  Arc::new(HandlerFn::new(move |req: HandleResult| async move {
    tokio::time::sleep(delay).await;
    Ok::<_, HandleFailure>(req)
  }))
}

/// Always fails with the given message.
pub(crate) fn failing_handler(message: &str) -> Arc<dyn Handler> {
  let message = message.to_string();
  Arc::new(HandlerFn::new(move |_req: HandleResult| {
    let message = message.clone();
    async move { Err::<HandleResult, _>(HandleFailure::from(PipelineError::HandleFailed(message))) }
  }))
}

/// Applies `f` to the numeric payload.
pub(crate) fn numeric_handler(f: fn(f64) -> f64) -> Arc<dyn Handler> {
  Arc::new(HandlerFn::new(move |req: HandleResult| async move {
    let n = req.data.as_f64().ok_or_else(|| {
      HandleFailure::from(PipelineError::HandleFailed("payload is not a number".to_string()))
    })?;
    Ok::<_, HandleFailure>(HandleResult::new(json!(f(n)), req.meta))
  }))
}

/// Builds delay handlers from `{"delay_ms": <u64>}`.
pub(crate) fn delay_builder() -> Arc<dyn HandlerBuilder> {
  Arc::new(BuilderFn::new(|_id: &str, conf: &Value| {
    let ms = conf["delay_ms"]
      .as_u64()
      .ok_or_else(|| PipelineError::HandlerConfInvalid("delay_ms is required".to_string()))?;
    Ok(delay_handler(Duration::from_millis(ms)))
  }))
}

/// Builds failing handlers from `{"message": <string>}`.
pub(crate) fn fail_builder() -> Arc<dyn HandlerBuilder> {
  Arc::new(BuilderFn::new(|_id: &str, conf: &Value| {
    let message = conf["message"]
      .as_str()
      .ok_or_else(|| PipelineError::HandlerConfInvalid("message is required".to_string()))?;
    Ok(failing_handler(message))
  }))
}

/// Registry with the `delay` and `fail` builders registered.
pub(crate) fn test_registry() -> BuilderRegistry {
  let registry = BuilderRegistry::new();
  registry.register("delay", delay_builder());
  registry.register("fail", fail_builder());
  registry
}

/// Handler map with the ids the engine tests reference.
pub(crate) fn test_handlers() -> HandlerMap {
  let mut handlers = HandlerMap::new();
  handlers.insert("delay_10".to_string(), delay_handler(Duration::from_millis(10)));
  handlers.insert(
    "delay_1000".to_string(),
    delay_handler(Duration::from_millis(1000)),
  );
  handlers.insert("failed_unknown".to_string(), failing_handler("unknown err"));
  handlers.insert("by_square".to_string(), numeric_handler(|n| n * n));
  handlers.insert("by_cubic".to_string(), numeric_handler(|n| n * n * n));
  handlers
}
