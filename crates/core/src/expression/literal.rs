//! Literal recognition and simple-value resolution.

use serde_json::Value;

use super::ExpressionError;
use crate::types::Context;

/// Recognise `token` as a complete literal.
///
/// Returns `Ok(None)` when the token is not a literal (it may still be an
/// identifier or a compound expression). A token that looks numeric but does
/// not parse is an error.
pub fn parse_literal(token: &str) -> Result<Option<Value>, ExpressionError> {
    match token {
        "true" => return Ok(Some(Value::Bool(true))),
        "false" => return Ok(Some(Value::Bool(false))),
        "null" => return Ok(Some(Value::Null)),
        _ => {}
    }

    if let Some(inner) = quoted_body(token) {
        // `"a" == "b"` also starts and ends with a quote; only a body without
        // the delimiter is a single literal.
        let quote = token.as_bytes()[0] as char;
        if !inner.contains(quote) {
            return Ok(Some(Value::String(inner.to_string())));
        }
        return Ok(None);
    }

    if looks_numeric(token) {
        return parse_number(token).map(Some);
    }

    Ok(None)
}

/// Resolve one operand of a comparison, arithmetic chain or aggregate.
///
/// Operands are never evaluated as sub-expressions: quoted strings, numbers,
/// keywords and exact context names are recognised; anything else evaluates
/// to itself as a string.
pub fn resolve_simple(token: &str, context: &Context) -> Result<Value, ExpressionError> {
    let token = token.trim();

    if token.starts_with('"') || token.starts_with('\'') {
        return match quoted_body(token) {
            Some(inner) => Ok(Value::String(inner.to_string())),
            None => Err(ExpressionError::MalformedLiteral(format!(
                "unterminated string {token}"
            ))),
        };
    }

    if looks_numeric(token) {
        return parse_number(token);
    }

    match token {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }

    if let Some(value) = context.get(token) {
        return Ok(value.clone());
    }

    Ok(Value::String(token.to_string()))
}

/// Body of a token wrapped in matching single or double quotes.
fn quoted_body(token: &str) -> Option<&str> {
    let first = token.chars().next()?;
    if (first == '"' || first == '\'') && token.len() >= 2 && token.ends_with(first) {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Optional leading `-`, then a digit, then only digits and dots.
fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn parse_number(token: &str) -> Result<Value, ExpressionError> {
    let malformed = || ExpressionError::MalformedLiteral(format!("invalid number {token}"));

    if !token.contains('.') {
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::from(n));
        }
    }
    if token.matches('.').count() > 1 || token.ends_with('.') {
        return Err(malformed());
    }
    let n = token.parse::<f64>().map_err(|_| malformed())?;
    crate::value::from_f64(n).ok_or_else(malformed)
}
