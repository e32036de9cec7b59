//! Restricted expression interpreter.
//!
//! Expressions are evaluated against a [`Context`] by a fixed priority of
//! substring tests rather than a grammar, so stored expressions keep their
//! historical meaning:
//!
//! 1. literals (`true`, `false`, `null`, quoted strings, numbers)
//! 2. exact context lookup of the whole expression
//! 3. the first of `== != <= >= < >` found splits the expression once; both
//!    sides are simple values
//! 4. `&&` then `||`, split on every occurrence, operands evaluated
//!    recursively with short-circuiting
//! 5. `+ - * /` over simple values
//! 6. `sum(...)`
//!
//! Anything left is a simple value: unresolved identifiers evaluate to
//! themselves as strings.

pub mod functions;
pub mod literal;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::types::Context;
use crate::value::{from_f64, loose_eq, to_number, truthy};

use literal::{parse_literal, resolve_simple};

/// Comparison operators in the order they are tested.
const COMPARISONS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("Expression cannot be empty")]
    Empty,

    #[error("Expression is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("Expression nesting exceeds depth {max}")]
    TooDeep { max: usize },

    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Type mismatch in '{op}': {detail}")]
    TypeMismatch { op: &'static str, detail: String },

    #[error("Result is not a finite number")]
    NonFiniteResult,
}

/// Expression evaluator bounded by an [`EngineConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter {
    config: EngineConfig,
}

impl Interpreter {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `expression` against `context`.
    pub fn evaluate(&self, expression: &str, context: &Context) -> Result<Value, ExpressionError> {
        let max = self.config.max_expression_length;
        if expression.len() > max {
            return Err(ExpressionError::TooLong {
                len: expression.len(),
                max,
            });
        }
        self.evaluate_at(expression, context, 0)
    }

    /// Evaluate `expression` as a pass/fail check. Never fails.
    ///
    /// null is false, numbers are true when non-zero, strings when non-empty,
    /// booleans pass through. Any evaluation error is false.
    pub fn evaluate_boolean(&self, expression: &str, context: &Context) -> bool {
        match self.evaluate(expression, context) {
            Ok(value) => truthy(&value),
            Err(e) => {
                tracing::warn!(expression, error = %e, "Expression evaluation error");
                false
            }
        }
    }

    fn evaluate_at(
        &self,
        expression: &str,
        context: &Context,
        depth: usize,
    ) -> Result<Value, ExpressionError> {
        if depth > self.config.max_expression_depth {
            return Err(ExpressionError::TooDeep {
                max: self.config.max_expression_depth,
            });
        }

        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ExpressionError::Empty);
        }

        if let Some(value) = parse_literal(trimmed)? {
            return Ok(value);
        }
        if let Some(value) = context.get(trimmed) {
            return Ok(value.clone());
        }

        if let Some(result) = comparison(trimmed, context)? {
            return Ok(result);
        }
        if let Some(result) = self.logical(trimmed, context, depth)? {
            return Ok(result);
        }
        if let Some(result) = arithmetic(trimmed, context)? {
            return Ok(result);
        }
        if let Some((name, args)) = call(trimmed) {
            if name == functions::SUM {
                return functions::sum(args, context);
            }
        }

        resolve_simple(trimmed, context)
    }

    fn logical(
        &self,
        expression: &str,
        context: &Context,
        depth: usize,
    ) -> Result<Option<Value>, ExpressionError> {
        if expression.contains("&&") {
            for part in expression.split("&&") {
                if !truthy(&self.evaluate_at(part, context, depth + 1)?) {
                    return Ok(Some(Value::Bool(false)));
                }
            }
            return Ok(Some(Value::Bool(true)));
        }
        if expression.contains("||") {
            for part in expression.split("||") {
                if truthy(&self.evaluate_at(part, context, depth + 1)?) {
                    return Ok(Some(Value::Bool(true)));
                }
            }
            return Ok(Some(Value::Bool(false)));
        }
        Ok(None)
    }
}

/// Evaluate with the default engine limits.
pub fn evaluate(expression: &str, context: &Context) -> Result<Value, ExpressionError> {
    Interpreter::default().evaluate(expression, context)
}

/// Boolean evaluation with the default engine limits. Never fails.
pub fn evaluate_boolean(expression: &str, context: &Context) -> bool {
    Interpreter::default().evaluate_boolean(expression, context)
}

fn comparison(expression: &str, context: &Context) -> Result<Option<Value>, ExpressionError> {
    let Some((op, (lhs, rhs))) = COMPARISONS
        .iter()
        .find_map(|op| expression.split_once(op).map(|sides| (*op, sides)))
    else {
        return Ok(None);
    };

    let left = resolve_simple(lhs, context)?;
    let right = resolve_simple(rhs, context)?;

    let result = match op {
        "==" => loose_eq(&left, &right),
        "!=" => !loose_eq(&left, &right),
        _ => match (to_number(&left), to_number(&right)) {
            (Some(l), Some(r)) => match op {
                "<=" => l <= r,
                ">=" => l >= r,
                "<" => l < r,
                _ => l > r,
            },
            _ => false,
        },
    };
    Ok(Some(Value::Bool(result)))
}

fn arithmetic(expression: &str, context: &Context) -> Result<Option<Value>, ExpressionError> {
    let result = if expression.contains('+') {
        let mut total = 0.0;
        for part in expression.split('+') {
            total += operand(part, context, "+")?;
        }
        total
    } else if let Some((lhs, rhs)) = expression
        .split_once('-')
        .filter(|_| !expression.starts_with('-'))
    {
        operand(lhs, context, "-")? - operand(rhs, context, "-")?
    } else if expression.contains('*') {
        let mut product = 1.0;
        for part in expression.split('*') {
            product *= operand(part, context, "*")?;
        }
        product
    } else if let Some((lhs, rhs)) = expression.split_once('/') {
        let dividend = operand(lhs, context, "/")?;
        let divisor = operand(rhs, context, "/")?;
        if divisor == 0.0 {
            return Err(ExpressionError::DivisionByZero);
        }
        dividend / divisor
    } else {
        return Ok(None);
    };

    from_f64(result)
        .map(Some)
        .ok_or(ExpressionError::NonFiniteResult)
}

fn operand(token: &str, context: &Context, op: &'static str) -> Result<f64, ExpressionError> {
    let value = resolve_simple(token, context)?;
    to_number(&value).ok_or_else(|| ExpressionError::TypeMismatch {
        op,
        detail: format!("non-numeric operand '{}'", token.trim()),
    })
}

/// Split `name(args)` on the first `(` and last `)`.
fn call(expression: &str) -> Option<(&str, &str)> {
    let open = expression.find('(')?;
    let close = expression.rfind(')')?;
    (open < close).then(|| (expression[..open].trim(), expression[open + 1..close].trim()))
}
