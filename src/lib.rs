//! # flowline
//!
//! JSON-assembled data-transformation pipeline engine: a request value flows
//! through an ordered [Line] of [Pipe]s, each pipe either a single handler or
//! a [Parallel] fan-out of handlers run concurrently, with per-step timeouts,
//! required/optional semantics, and default-value fallback.
//!
//! ## Architecture
//!
//! A [handler::Handler] is the unit of computation; a [Pipe] wraps one with
//! timeout and required/default policy; a [Line] threads state through pipes
//! in sequence. Pipelines are assembled at runtime from a JSON array
//! ([Line::from_json]) against an injected [registry::BuilderRegistry] of
//! named handler factories and a map of pre-built handlers.
//!
//! A timed-out handler task is abandoned, never aborted: it keeps running in
//! the background and its eventual result is discarded.

pub mod builders;
pub mod error;
pub mod handler;
pub mod line;
pub mod parallel;
pub mod pipe;
#[cfg(test)]
mod pipe_test;
pub mod registry;
#[cfg(test)]
mod test_support;
pub mod types;

pub use error::{HandleFailure, PipelineError, VerboseFailure};
pub use handler::{BuilderFn, Handler, HandlerBuilder, HandlerFn, HandlerMap};
pub use line::Line;
pub use parallel::Parallel;
pub use pipe::{Pipe, PipeKind};
pub use registry::BuilderRegistry;
pub use types::{HandleResult, HandleStatus, ParamMap, PipeConf};
