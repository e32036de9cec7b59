//! Aggregate function shorthand.
//!
//! Only `sum` is recognised:
//! - `sum(items.amount)` sums the `amount` field of every map in `items`
//! - `sum(values)` sums a list of numbers
//!
//! Items without a numeric view contribute 0.

use serde_json::Value;

use super::literal::resolve_simple;
use super::ExpressionError;
use crate::types::Context;
use crate::value::{from_f64, to_number, type_name};

pub const SUM: &str = "sum";

pub fn sum(args: &str, context: &Context) -> Result<Value, ExpressionError> {
    let total = match args.split_once('.') {
        Some((list_name, field)) => {
            let field = field.trim();
            expect_list(list_name, context)?
                .iter()
                .filter_map(|item| item.as_object())
                .filter_map(|item| item.get(field).and_then(to_number))
                .sum::<f64>()
        }
        None => expect_list(args, context)?
            .iter()
            .filter_map(to_number)
            .sum::<f64>(),
    };
    from_f64(total).ok_or(ExpressionError::NonFiniteResult)
}

fn expect_list(name: &str, context: &Context) -> Result<Vec<Value>, ExpressionError> {
    match resolve_simple(name, context)? {
        Value::Array(items) => Ok(items),
        other => Err(ExpressionError::TypeMismatch {
            op: SUM,
            detail: format!("expects a list, got {}", type_name(&other)),
        }),
    }
}
