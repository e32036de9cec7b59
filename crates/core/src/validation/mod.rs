//! Validation rule engine.
//!
//! - [`rules`]: rule definitions and the errors they produce
//! - [`evaluator`]: per-rule evaluation, pure logic
//! - [`engine`]: [`ValidationEngine`], which loads rules and orders results

pub mod engine;
pub mod evaluator;
pub mod rules;

pub use engine::{ValidationEngine, TRIGGER_TRANSITION, TRIGGER_UPDATE};
pub use evaluator::build_context;
pub use rules::{ErrorLevel, RuleScope, RuleType, ValidationError, ValidationRule};
