//! JSON field-extraction step: pulls named fields out of a JSON document
//! with required/default semantics.
//!
//! Conf: `{"confs": {"<out name>": {"path": "a.b.0.c", "required": bool,
//! "default_value": <any>}}}`. The input payload is either a JSON string
//! (parsed first) or an already-structured value. Output is an object with
//! one entry per conf.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{HandleFailure, PipelineError};
use crate::handler::{BuilderFn, Handler, HandlerBuilder};
use crate::types::HandleResult;

/// One extraction: a dot-separated path plus required/default policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConf {
  pub path: String,
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub default_value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ExtractorConf {
  #[serde(default)]
  confs: HashMap<String, ExtractConf>,
}

/// Handler extracting a fixed set of named fields per invocation.
#[derive(Debug, Clone)]
pub struct JsonExtractor {
  id: String,
  confs: HashMap<String, ExtractConf>,
}

impl JsonExtractor {
  /// Parses and validates the builder conf: at least one extraction, every
  /// path non-empty.
  pub fn from_conf(id: &str, conf: &Value) -> Result<Self, PipelineError> {
    let conf: ExtractorConf = serde_json::from_value(conf.clone())
      .map_err(|e| PipelineError::HandlerConfInvalid(format!("extractor conf: {e}")))?;
    if conf.confs.is_empty() {
      return Err(PipelineError::HandlerConfInvalid("confs is required".to_string()));
    }
    for (name, extract) in &conf.confs {
      if extract.path.trim().is_empty() {
        return Err(PipelineError::HandlerConfInvalid(format!(
          "path is required for '{name}'"
        )));
      }
    }
    Ok(Self {
      id: id.to_string(),
      confs: conf.confs,
    })
  }

  /// The registry entry for this step type.
  pub fn builder() -> Arc<dyn HandlerBuilder> {
    Arc::new(BuilderFn::new(|id: &str, conf: &Value| {
      Ok(Arc::new(JsonExtractor::from_conf(id, conf)?) as Arc<dyn Handler>)
    }))
  }
}

#[async_trait]
impl Handler for JsonExtractor {
  async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    let doc = match &req.data {
      Value::String(text) => serde_json::from_str(text).map_err(|e| {
        PipelineError::HandleFailed(format!("{}: input is not valid JSON: {e}", self.id))
      })?,
      value => value.clone(),
    };

    let mut out = serde_json::Map::with_capacity(self.confs.len());
    for (name, extract) in &self.confs {
      match lookup(&doc, &extract.path) {
        Some(value) if !value.is_null() => {
          out.insert(name.clone(), value.clone());
        }
        _ if extract.required => {
          return Err(
            PipelineError::HandleFailed(format!("data lost, path={}", extract.path)).into(),
          );
        }
        _ => {
          out.insert(
            name.clone(),
            extract.default_value.clone().unwrap_or(Value::Null),
          );
        }
      }
    }

    Ok(HandleResult::new(Value::Object(out), req.meta))
  }
}

/// Walks a dot-separated path: object segments by key, array segments by
/// numeric index.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
  let mut current = doc;
  for segment in path.split('.') {
    current = match current {
      Value::Object(map) => map.get(segment)?,
      Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
      _ => return None,
    };
  }
  Some(current)
}
