//! Built-in handler builders: ordinary [crate::handler::Handler]
//! implementations behind the registry, with no engine-level coupling.

pub mod expr;
pub mod json_extract;

pub use expr::ExprHandler;
pub use json_extract::JsonExtractor;

use crate::registry::BuilderRegistry;

/// Builder name for the arithmetic expression step.
pub const BUILDER_CALC_EXPR: &str = "calc_expr";
/// Builder name for the JSON field-extraction step.
pub const BUILDER_JSON_EXTRACT: &str = "json_extract";

/// A registry pre-populated with every built-in builder. Callers plug in
/// additional step types with [BuilderRegistry::register].
pub fn default_registry() -> BuilderRegistry {
  let registry = BuilderRegistry::new();
  registry.register(BUILDER_CALC_EXPR, ExprHandler::builder());
  registry.register(BUILDER_JSON_EXTRACT, JsonExtractor::builder());
  registry
}
