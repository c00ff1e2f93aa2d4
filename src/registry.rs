//! Builder registry: named handler factories consulted during assembly.
//!
//! The registry is an explicit, constructor-injected object rather than
//! process-wide mutable state, so assembly stays deterministic and tests can
//! isolate themselves with [BuilderRegistry::replace_all]. Populated before
//! request traffic, read-mostly thereafter; a `std::sync::RwLock` keeps the
//! rare write from corrupting concurrent lookups.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::PipelineError;
use crate::handler::{Handler, HandlerBuilder};

/// Registry mapping step-type names to handler builders.
#[derive(Default)]
pub struct BuilderRegistry {
  builders: RwLock<HashMap<String, Arc<dyn HandlerBuilder>>>,
}

impl BuilderRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Looks up the builder registered under `name`.
  pub fn get(&self, name: &str) -> Option<Arc<dyn HandlerBuilder>> {
    self.builders.read().expect("registry lock poisoned").get(name).cloned()
  }

  /// All registered builder names, unordered.
  pub fn names(&self) -> Vec<String> {
    self
      .builders
      .read()
      .expect("registry lock poisoned")
      .keys()
      .cloned()
      .collect()
  }

  /// Registers `builder` under `name`, replacing any previous entry.
  pub fn register(&self, name: impl Into<String>, builder: Arc<dyn HandlerBuilder>) {
    let name = name.into();
    tracing::debug!(builder = %name, "registering handler builder");
    self
      .builders
      .write()
      .expect("registry lock poisoned")
      .insert(name, builder);
  }

  /// Replaces the whole mapping. Used for test isolation and for plugging in
  /// additional step types without touching the engine.
  pub fn replace_all(&self, builders: HashMap<String, Arc<dyn HandlerBuilder>>) {
    *self.builders.write().expect("registry lock poisoned") = builders;
  }

  /// Finds the builder for `name` and uses it to build a handler.
  /// Fails with [PipelineError::HandlerBuilderNotFound] for an unregistered
  /// name; a builder-side error is wrapped with the builder name for context.
  pub fn build(
    &self,
    name: &str,
    id: &str,
    conf: &Value,
  ) -> Result<Arc<dyn Handler>, PipelineError> {
    let builder = self
      .get(name)
      .ok_or_else(|| PipelineError::HandlerBuilderNotFound(name.to_string()))?;
    builder
      .build(id, conf)
      .map_err(|e| PipelineError::BuildHandlerFailed {
        name: name.to_string(),
        cause: e.to_string(),
      })
  }
}

impl std::fmt::Debug for BuilderRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names = self.names();
    names.sort();
    f.debug_struct("BuilderRegistry").field("names", &names).finish()
  }
}
