//! Arithmetic expression step: runs a user-supplied formula against the
//! numeric input payload.
//!
//! Conf: `{"expr": "<formula>"}`. The formula reads the input through the
//! variable `in_value`; e.g. `"in_value * in_value"` squares the payload.
//! Grammar (precedence low to high): `+` `-`, then `*` `/` `%`, then unary
//! minus, then literals / `in_value` / parentheses.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::{HandleFailure, PipelineError};
use crate::handler::{BuilderFn, Handler, HandlerBuilder};
use crate::types::HandleResult;

#[derive(Debug, Deserialize)]
struct ExprConf {
  #[serde(default)]
  expr: String,
}

/// Handler evaluating one fixed arithmetic expression per invocation.
#[derive(Debug, Clone)]
pub struct ExprHandler {
  id: String,
  expr: String,
}

impl ExprHandler {
  /// Parses and validates the builder conf. The expression must be present
  /// and syntactically valid; assembly fails fast otherwise.
  pub fn from_conf(id: &str, conf: &Value) -> Result<Self, PipelineError> {
    let conf: ExprConf = serde_json::from_value(conf.clone())
      .map_err(|e| PipelineError::HandlerConfInvalid(format!("expr conf: {e}")))?;
    if conf.expr.trim().is_empty() {
      return Err(PipelineError::HandlerConfInvalid("expr is required".to_string()));
    }
    // Syntax probe; the bound value is irrelevant.
    evaluate(&conf.expr, 1.0).map_err(PipelineError::HandlerConfInvalid)?;
    Ok(Self {
      id: id.to_string(),
      expr: conf.expr,
    })
  }

  /// The registry entry for this step type.
  pub fn builder() -> Arc<dyn HandlerBuilder> {
    Arc::new(BuilderFn::new(|id: &str, conf: &Value| {
      Ok(Arc::new(ExprHandler::from_conf(id, conf)?) as Arc<dyn Handler>)
    }))
  }
}

#[async_trait]
impl Handler for ExprHandler {
  async fn handle(&self, req: HandleResult) -> Result<HandleResult, HandleFailure> {
    let in_value = req.data.as_f64().ok_or_else(|| {
      PipelineError::HandleFailed(format!("{}: in_value is not a number", self.id))
    })?;
    let out = evaluate(&self.expr, in_value)
      .map_err(|msg| PipelineError::HandleFailed(format!("{}: {msg}", self.id)))?;
    let number = Number::from_f64(out).ok_or_else(|| {
      PipelineError::HandleFailed(format!(
        "{}: expression produced a non-finite number",
        self.id
      ))
    })?;
    Ok(HandleResult::new(Value::Number(number), req.meta))
  }
}

/// Evaluates `expr` with `in_value` bound.
fn evaluate(expr: &str, in_value: f64) -> Result<f64, String> {
  let mut parser = Parser {
    src: expr.as_bytes(),
    pos: 0,
    in_value,
  };
  let value = parser.expression()?;
  if let Some(c) = parser.peek() {
    return Err(format!("unexpected character '{}' at byte {}", c as char, parser.pos));
  }
  Ok(value)
}

struct Parser<'a> {
  src: &'a [u8],
  pos: usize,
  in_value: f64,
}

impl Parser<'_> {
  fn peek(&mut self) -> Option<u8> {
    while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
      self.pos += 1;
    }
    self.src.get(self.pos).copied()
  }

  fn expression(&mut self) -> Result<f64, String> {
    let mut value = self.term()?;
    while let Some(op @ (b'+' | b'-')) = self.peek() {
      self.pos += 1;
      let rhs = self.term()?;
      value = if op == b'+' { value + rhs } else { value - rhs };
    }
    Ok(value)
  }

  fn term(&mut self) -> Result<f64, String> {
    let mut value = self.unary()?;
    while let Some(op @ (b'*' | b'/' | b'%')) = self.peek() {
      self.pos += 1;
      let rhs = self.unary()?;
      value = match op {
        b'*' => value * rhs,
        b'/' => value / rhs,
        _ => value % rhs,
      };
    }
    Ok(value)
  }

  fn unary(&mut self) -> Result<f64, String> {
    if self.peek() == Some(b'-') {
      self.pos += 1;
      return Ok(-self.unary()?);
    }
    self.primary()
  }

  fn primary(&mut self) -> Result<f64, String> {
    match self.peek() {
      Some(b'(') => {
        self.pos += 1;
        let value = self.expression()?;
        if self.peek() != Some(b')') {
          return Err("expected ')'".to_string());
        }
        self.pos += 1;
        Ok(value)
      }
      Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
      Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.identifier(),
      Some(c) => Err(format!("unexpected character '{}'", c as char)),
      None => Err("unexpected end of expression".to_string()),
    }
  }

  fn number(&mut self) -> Result<f64, String> {
    let start = self.pos;
    while self.pos < self.src.len()
      && (self.src[self.pos].is_ascii_digit() || self.src[self.pos] == b'.')
    {
      self.pos += 1;
    }
    let text = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii digits");
    text
      .parse::<f64>()
      .map_err(|_| format!("invalid number '{text}'"))
  }

  fn identifier(&mut self) -> Result<f64, String> {
    let start = self.pos;
    while self.pos < self.src.len()
      && (self.src[self.pos].is_ascii_alphanumeric() || self.src[self.pos] == b'_')
    {
      self.pos += 1;
    }
    let name = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii identifier");
    if name == "in_value" {
      Ok(self.in_value)
    } else {
      Err(format!("unknown variable '{name}'"))
    }
  }
}
