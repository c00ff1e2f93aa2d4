//! Tests for single pipe construction and the timeout/required policy.

use serde_json::json;

use crate::error::PipelineError;
use crate::pipe::{Pipe, PipeKind};
use crate::test_support::{test_handlers, test_registry};
use crate::types::{HandleResult, HandleStatus, PipeConf};

fn ref_conf(id: &str, timeout: i64, required: bool) -> PipeConf {
  PipeConf {
    timeout,
    required,
    ref_handler_id: Some(id.to_string()),
    ..PipeConf::default()
  }
}

#[test]
fn single_rejects_unvalidated_conf() {
  let conf = PipeConf {
    desc: "negative-timeout".to_string(),
    timeout: -1,
    ..PipeConf::default()
  };
  let err = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap_err();
  assert!(matches!(err, PipelineError::TimeoutInvalid));
}

#[test]
fn single_rejects_unknown_ref_handler() {
  let conf = ref_conf("not_found", 1000, true);
  let err = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap_err();
  match err {
    PipelineError::RefHandlerNotFound(id) => assert_eq!(id, "not_found"),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn single_rejects_unknown_builder_name() {
  let conf = PipeConf {
    timeout: 1000,
    required: true,
    handler_builder_name: Some("not_found".to_string()),
    ..PipeConf::default()
  };
  let err = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap_err();
  match err {
    PipelineError::HandlerBuilderNotFound(name) => assert_eq!(name, "not_found"),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn single_without_ref_or_builder_fails_builder_lookup() {
  let conf = PipeConf {
    timeout: 1000,
    required: true,
    ..PipeConf::default()
  };
  let err = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap_err();
  assert!(matches!(err, PipelineError::HandlerBuilderNotFound(_)));
}

#[test]
fn single_surfaces_builder_conf_error() {
  let conf = PipeConf {
    timeout: 1000,
    required: true,
    handler_builder_name: Some("delay".to_string()),
    handler_builder_conf: Some(json!({"delay_ms": "oops"})),
    ..PipeConf::default()
  };
  let err = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap_err();
  match err {
    PipelineError::BuildHandlerFailed { name, cause } => {
      assert_eq!(name, "delay");
      assert!(cause.contains("delay_ms"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn single_resolves_ref_handler() {
  let pipe = Pipe::single(
    ref_conf("delay_1000", 1000, true),
    &test_registry(),
    &test_handlers(),
  )
  .unwrap();
  assert_eq!(pipe.kind, PipeKind::Single);
  assert_eq!(pipe.conf.ref_handler_id.as_deref(), Some("delay_1000"));
}

#[test]
fn single_builds_from_builder() {
  let conf = PipeConf {
    timeout: 1000,
    required: true,
    handler_builder_name: Some("delay".to_string()),
    handler_builder_conf: Some(json!({"delay_ms": 10})),
    ..PipeConf::default()
  };
  let pipe = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap();
  assert_eq!(pipe.kind, PipeKind::Single);
}

#[test]
fn single_all_builds_one_pipe_per_conf() {
  let confs = vec![
    ref_conf("delay_1000", 1000, true),
    PipeConf {
      timeout: 1000,
      required: true,
      handler_builder_name: Some("delay".to_string()),
      handler_builder_conf: Some(json!({"delay_ms": 10})),
      ..PipeConf::default()
    },
  ];
  let pipes = Pipe::single_all(confs, &test_registry(), &test_handlers()).unwrap();
  assert_eq!(pipes.len(), 2);
}

#[test]
fn single_all_fails_on_first_bad_entry() {
  let confs = vec![ref_conf("delay_10", 1000, true), ref_conf("not_found", 1000, true)];
  let err = Pipe::single_all(confs, &test_registry(), &test_handlers()).unwrap_err();
  assert!(matches!(err, PipelineError::RefHandlerNotFound(_)));
}

#[test]
fn parallel_wraps_a_group() {
  let confs = vec![
    ref_conf("delay_1000", 1000, true),
    ref_conf("delay_10", 1000, true),
  ];
  let pipe = Pipe::parallel(confs, &test_registry(), &test_handlers()).unwrap();
  assert_eq!(pipe.kind, PipeKind::Parallel);
}

#[tokio::test]
async fn handle_required_timeout_surfaces_error() {
  let mut conf = ref_conf("delay_1000", 500, true);
  conf.desc = "slow".to_string();
  let pipe = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap();
  let failure = pipe
    .handle(HandleResult::with_data(json!(2.0)))
    .await
    .unwrap_err();
  assert!(failure.source.is_timeout());
  assert_eq!(failure.result.status, HandleStatus::Timeout);
  assert_eq!(failure.result.message, "slow: handle timeout within 500ms");
  assert!(failure.result.data.is_null());
}

#[tokio::test]
async fn handle_required_failure_surfaces_error() {
  let pipe = Pipe::single(
    ref_conf("failed_unknown", 500, true),
    &test_registry(),
    &test_handlers(),
  )
  .unwrap();
  let failure = pipe
    .handle(HandleResult::with_data(json!(2.0)))
    .await
    .unwrap_err();
  assert!(matches!(failure.source, PipelineError::HandleFailed(_)));
  assert_eq!(failure.result.status, HandleStatus::Failed);
}

#[tokio::test]
async fn handle_non_required_timeout_uses_default() {
  let conf = PipeConf {
    desc: "slow".to_string(),
    timeout: 500,
    required: false,
    default_data: Some(json!(-1)),
    ref_handler_id: Some("delay_1000".to_string()),
    ..PipeConf::default()
  };
  let pipe = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap();
  let mut req = HandleResult::with_data(json!(2.0));
  req.meta.insert("token".to_string(), json!("abc"));

  let res = pipe.handle(req).await.unwrap();
  assert_eq!(res.status, HandleStatus::Timeout);
  assert_eq!(res.message, "slow: handle timeout within 500ms");
  assert_eq!(res.data, json!(-1));
  // Input meta propagates through the fallback.
  assert_eq!(res.meta.get("token"), Some(&json!("abc")));
}

#[tokio::test]
async fn handle_non_required_failure_uses_default() {
  let conf = PipeConf {
    timeout: 500,
    required: false,
    default_data: Some(json!(-1)),
    ref_handler_id: Some("failed_unknown".to_string()),
    ..PipeConf::default()
  };
  let pipe = Pipe::single(conf, &test_registry(), &test_handlers()).unwrap();
  let res = pipe.handle(HandleResult::with_data(json!(2.0))).await.unwrap();
  assert_eq!(res.status, HandleStatus::Failed);
  assert_eq!(res.message, "handle failed: unknown err");
  assert_eq!(res.data, json!(-1));
}

#[tokio::test]
async fn handle_ok_stamps_status_and_passes_payload_through() {
  let pipe = Pipe::single(
    ref_conf("by_square", 500, true),
    &test_registry(),
    &test_handlers(),
  )
  .unwrap();
  let mut req = HandleResult::with_data(json!(2.0));
  req.meta.insert("token".to_string(), json!("abc"));

  let res = pipe.handle(req).await.unwrap();
  assert_eq!(res.status, HandleStatus::Ok);
  assert_eq!(res.data, json!(4.0));
  assert_eq!(res.meta.get("token"), Some(&json!("abc")));
}

#[tokio::test]
async fn handle_within_timeout_succeeds() {
  let pipe = Pipe::single(
    ref_conf("delay_10", 200, true),
    &test_registry(),
    &test_handlers(),
  )
  .unwrap();
  let res = pipe.handle(HandleResult::with_data(json!(1))).await.unwrap();
  assert_eq!(res.status, HandleStatus::Ok);
  assert_eq!(res.data, json!(1));
}
