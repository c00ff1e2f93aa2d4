//! Data types flowing through a pipeline: results, statuses, pipe confs.
//!
//! These types are JSON-serializable; steps agree on payload shape by
//! convention, not schema.

use std::collections::HashMap;

mod handle_result;
mod pipe_conf;

pub use handle_result::{HandleResult, HandleStatus};
pub use pipe_conf::PipeConf;

/// Out-of-band context carried alongside the payload (auth tokens, trace ids).
/// A handler may read and rewrite it; otherwise it propagates forward as-is.
pub type ParamMap = HashMap<String, serde_json::Value>;
