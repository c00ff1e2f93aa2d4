//! Fan-out aggregator: runs a group of pipes concurrently against the same
//! input and joins their results in declaration order.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::error::{HandleFailure, PipelineError};
use crate::handler::{Handler, HandlerMap};
use crate::pipe::Pipe;
use crate::registry::BuilderRegistry;
use crate::types::{HandleResult, HandleStatus, PipeConf};

/// A group of single pipes executed concurrently against one input. Each
/// entry is independently subject to its own timeout and required/default
/// policy; the group itself carries neither.
#[derive(Debug, Clone)]
pub struct Parallel {
  pub pipes: Vec<Pipe>,
}

impl Parallel {
  /// Builds one single pipe per conf, same resolution rules as
  /// [Pipe::single], applied independently per entry.
  pub fn new(
    confs: Vec<PipeConf>,
    registry: &BuilderRegistry,
    handlers: &HandlerMap,
  ) -> Result<Self, PipelineError> {
    let pipes = Pipe::single_all(confs, registry, handlers)?;
    Ok(Self { pipes })
  }
}

#[async_trait]
impl Handler for Parallel {
  /// Fans the input out to every entry, waits for all per-entry decisions,
  /// and aggregates payloads into an array whose position matches entry
  /// order, never completion order. Each spawned task owns its slot via the
  /// ordered join; no shared mutable aggregation state exists.
  ///
  /// A failed required entry reports `null` in its slot and turns the
  /// overall status to Failed; the error joins every entry's message,
  /// index-qualified and comma-separated. Non-required failures were already
  /// swallowed into defaults by their own pipe and count as successes here.
  async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    let meta = req.meta.clone();

    let mut tasks = Vec::with_capacity(self.pipes.len());
    for pipe in &self.pipes {
      let pipe = pipe.clone();
      let input = req.clone();
      tasks.push(tokio::spawn(async move { pipe.handle(input).await }));
    }
    let joined = join_all(tasks).await;

    let mut data = vec![Value::Null; self.pipes.len()];
    let mut errs = Vec::with_capacity(self.pipes.len());
    let mut has_err = false;
    for (idx, joined_outcome) in joined.into_iter().enumerate() {
      let outcome = match joined_outcome {
        Ok(outcome) => outcome,
        Err(join_err) => Err(
          PipelineError::HandleFailed(format!("handler task panicked: {join_err}")).into(),
        ),
      };
      match outcome {
        Ok(res) => {
          data[idx] = res.data;
          errs.push(format!("{}:null", idx + 1));
        }
        Err(failure) => {
          has_err = true;
          errs.push(format!("{}:{}", idx + 1, failure.source));
        }
      }
    }

    if has_err {
      let result = HandleResult {
        status: HandleStatus::Failed,
        message: String::new(),
        meta,
        data: Value::Array(data),
      };
      let source = PipelineError::HandleFailed(format!("errs: {}", errs.join(",")));
      return Err(HandleFailure::with_result(result, source));
    }

    Ok(HandleResult {
      status: HandleStatus::Ok,
      message: String::new(),
      meta,
      data: Value::Array(data),
    })
  }
}
