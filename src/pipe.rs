//! The runtime unit wrapping a handler with timeout enforcement and
//! required/default fallback policy.
//!
//! A single pipe races its handler against a timer; a parallel pipe defers
//! entirely to its [crate::parallel::Parallel] handler (the wrapper itself is
//! never required or independently timed, only its children are).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{HandleFailure, PipelineError};
use crate::handler::{Handler, HandlerMap};
use crate::parallel::Parallel;
use crate::registry::BuilderRegistry;
use crate::types::{HandleResult, HandleStatus, PipeConf};

/// Whether a pipe wraps one handler or a fan-out group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeKind {
  Single,
  Parallel,
}

/// One executable pipeline step. Created once at assembly time from a
/// validated conf; immutable after construction.
#[derive(Clone)]
pub struct Pipe {
  pub kind: PipeKind,
  /// Policy conf. Meaningful for single pipes only; a parallel pipe carries
  /// the default conf and defers policy to its children.
  pub conf: PipeConf,
  handler: Arc<dyn Handler>,
}

impl Pipe {
  /// Builds a single pipe from a validated conf. Resolution order: an
  /// existing handler referenced by `ref_handler_id` first (used as-is, no
  /// builder conf applies), then construction via the builder registry.
  pub fn single(
    conf: PipeConf,
    registry: &BuilderRegistry,
    handlers: &HandlerMap,
  ) -> Result<Self, PipelineError> {
    conf.validate()?;

    if let Some(id) = conf.ref_handler_id.as_deref() {
      let handler = handlers
        .get(id)
        .cloned()
        .ok_or_else(|| PipelineError::RefHandlerNotFound(id.to_string()))?;
      return Ok(Self {
        kind: PipeKind::Single,
        conf,
        handler,
      });
    }

    // An absent builder name funnels into the not-found error as well.
    let name = conf.handler_builder_name.clone().unwrap_or_default();
    let builder_conf = conf.handler_builder_conf.clone().unwrap_or(Value::Null);
    let handler = registry.build(&name, &conf.desc, &builder_conf)?;
    Ok(Self {
      kind: PipeKind::Single,
      conf,
      handler,
    })
  }

  /// Builds one single pipe per conf, failing on the first bad entry.
  pub fn single_all(
    confs: Vec<PipeConf>,
    registry: &BuilderRegistry,
    handlers: &HandlerMap,
  ) -> Result<Vec<Self>, PipelineError> {
    confs
      .into_iter()
      .map(|conf| Self::single(conf, registry, handlers))
      .collect()
  }

  /// Builds a parallel pipe fanning out over one child pipe per conf.
  pub fn parallel(
    confs: Vec<PipeConf>,
    registry: &BuilderRegistry,
    handlers: &HandlerMap,
  ) -> Result<Self, PipelineError> {
    let group = Parallel::new(confs, registry, handlers)?;
    Ok(Self {
      kind: PipeKind::Parallel,
      conf: PipeConf::default(),
      handler: Arc::new(group),
    })
  }

  /// Handles `req` under this pipe's policy.
  ///
  /// Single pipes race the handler against the conf timeout, derive the
  /// status (Ok / Failed / Timeout), then branch on `required`: a required
  /// non-Ok outcome surfaces a [HandleFailure]; a non-required one is
  /// swallowed into the conf's `default_data`. Parallel pipes delegate to
  /// their aggregator unchanged.
  pub async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    if self.kind == PipeKind::Parallel {
      return self.handler.handle(req).await;
    }

    let meta = req.meta.clone();
    let handler = Arc::clone(&self.handler);
    let task = tokio::spawn(async move { handler.handle(req).await });

    let timeout = Duration::from_millis(self.conf.timeout as u64);
    let outcome = match tokio::time::timeout(timeout, task).await {
      Ok(Ok(handled)) => handled,
      Ok(Err(join_err)) => Err(
        PipelineError::HandleFailed(format!("handler task panicked: {join_err}")).into(),
      ),
      // Timer fired first. The spawned task is abandoned, not aborted: it
      // keeps running in the background and its eventual result is
      // discarded.
      Err(_) => Err(
        PipelineError::HandleTimeout {
          desc: self.conf.desc.clone(),
          timeout_ms: self.conf.timeout,
        }
        .into(),
      ),
    };

    match outcome {
      Ok(mut res) => {
        res.status = HandleStatus::Ok;
        Ok(res)
      }
      Err(failure) if self.conf.required => {
        let status = if failure.source.is_timeout() {
          HandleStatus::Timeout
        } else {
          HandleStatus::Failed
        };
        let result = HandleResult {
          status,
          message: failure.source.to_string(),
          ..HandleResult::default()
        };
        Err(HandleFailure::with_result(result, failure.source))
      }
      Err(failure) => {
        let status = if failure.source.is_timeout() {
          HandleStatus::Timeout
        } else {
          HandleStatus::Failed
        };
        tracing::warn!(
          pipe = %self.conf.desc,
          error = %failure.source,
          "pipe failed, falling back to default data"
        );
        Ok(HandleResult {
          status,
          message: failure.source.to_string(),
          meta,
          data: self.conf.default_data.clone().unwrap_or(Value::Null),
        })
      }
    }
  }
}

impl fmt::Debug for Pipe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipe")
      .field("kind", &self.kind)
      .field("conf", &self.conf)
      .finish_non_exhaustive()
  }
}
