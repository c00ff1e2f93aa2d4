//! Ordered sequence of pipes threading state step to step, plus the JSON
//! assembly grammar that builds one.
//!
//! Assembly grammar: a top-level JSON array where each element is either an
//! object (one single pipe) or an array of objects (one parallel group).
//! Deeper nesting is rejected; no line is ever built partially.

use serde_json::Value;

use crate::error::{HandleFailure, PipelineError, VerboseFailure};
use crate::handler::HandlerMap;
use crate::pipe::Pipe;
use crate::registry::BuilderRegistry;
use crate::types::{HandleResult, PipeConf};

/// An assembled pipeline: pipes run strictly in sequence, the output of step
/// *k* becoming the input of step *k+1*. Stateless across invocations.
#[derive(Debug, Clone)]
pub struct Line {
  pub id: String,
  pub pipes: Vec<Pipe>,
}

impl Line {
  /// Parses `json_conf` and assembles a line against the given registry and
  /// handler map. Any conf, resolution, or format error aborts assembly with
  /// no partial line.
  pub fn from_json(
    id: impl Into<String>,
    json_conf: &str,
    registry: &BuilderRegistry,
    handlers: &HandlerMap,
  ) -> Result<Self, PipelineError> {
    let items: Vec<Value> = serde_json::from_str(json_conf)
      .map_err(|e| PipelineError::AssemblyFormat(e.to_string()))?;

    let mut pipes = Vec::with_capacity(items.len());
    for item in items {
      match item {
        Value::Object(_) => {
          let conf: PipeConf = serde_json::from_value(item)
            .map_err(|e| PipelineError::AssemblyFormat(e.to_string()))?;
          pipes.push(Pipe::single(conf, registry, handlers)?);
        }
        Value::Array(entries) => {
          if entries.iter().any(|entry| !entry.is_object()) {
            return Err(PipelineError::AssemblyFormat(
              "a parallel group may only contain pipe conf objects".to_string(),
            ));
          }
          let confs: Vec<PipeConf> = serde_json::from_value(Value::Array(entries))
            .map_err(|e| PipelineError::AssemblyFormat(e.to_string()))?;
          pipes.push(Pipe::parallel(confs, registry, handlers)?);
        }
        other => {
          return Err(PipelineError::AssemblyFormat(format!(
            "pipe conf must be an object or an array, got: {other}"
          )));
        }
      }
    }

    Ok(Self {
      id: id.into(),
      pipes,
    })
  }

  /// Runs the pipes one by one, returning immediately on the first required
  /// failure. A non-required failure feeds its default data to the next
  /// step; the caller never sees that error.
  pub async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    let mut res = req;
    for (step, pipe) in self.pipes.iter().enumerate() {
      res = pipe.handle(res).await?;
      tracing::debug!(line = %self.id, step, status = ?res.status, "step done");
    }
    Ok(res)
  }

  /// Identical stepping to [Line::handle], but appends a deep copy of every
  /// step's result to an ordered log. On a required failure the failing
  /// step's snapshot is still appended before the error is returned, inside
  /// the [VerboseFailure].
  pub async fn handle_verbosely(
    &self,
    req: HandleResult,
  ) -> Result<Vec<HandleResult>, VerboseFailure> {
    let mut log = Vec::with_capacity(self.pipes.len());
    let mut res = req;
    for (step, pipe) in self.pipes.iter().enumerate() {
      match pipe.handle(res).await {
        Ok(next) => {
          log.push(next.clone());
          res = next;
        }
        Err(failure) => {
          tracing::debug!(line = %self.id, step, error = %failure.source, "step failed");
          log.push(failure.result);
          return Err(VerboseFailure {
            log,
            source: failure.source,
          });
        }
      }
    }
    Ok(log)
  }
}
