//! Explicit coercions over the dynamically-typed [`Value`].
//!
//! Contexts and record data are `serde_json` maps, so the tagged union is
//! `serde_json::Value` (null / bool / number / string / array / object).
//! Every implicit conversion the interpreter and rule engine perform goes
//! through one of these functions.

pub use serde_json::Value;

/// Numeric view of a value: numbers as-is, strings parsed as decimals.
///
/// Everything else (including unparseable strings) has no numeric view.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Truthiness used by boolean evaluation and logical operators.
///
/// null is false, numbers are true when non-zero, strings when non-empty,
/// booleans pass through. Lists and maps are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Equality used by `==` / `!=`.
///
/// Two numbers compare by their `f64` value so `1 == 1.0`; any other pair
/// compares structurally.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Wrap a float result. Non-finite floats have no JSON representation.
pub fn from_f64(n: f64) -> Option<Value> {
    serde_json::Number::from_f64(n).map(Value::Number)
}

/// Short type name used in error messages and TYPE checks.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// True for null and for strings that are empty after trimming.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_coerce() {
        assert_eq!(to_number(&json!(2)), Some(2.0));
        assert_eq!(to_number(&json!(2.5)), Some(2.5));
        assert_eq!(to_number(&json!(" 7 ")), Some(7.0));
        assert_eq!(to_number(&json!("x")), None);
        assert_eq!(to_number(&json!(true)), None);
        assert_eq!(to_number(&Value::Null), None);
    }

    #[test]
    fn truthiness() {
        assert!(!truthy(&Value::Null));
        assert!(truthy(&json!(true)));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!(-0.5)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!("no")));
        assert!(!truthy(&json!([1])));
    }

    #[test]
    fn integer_equals_float() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(!loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!("a"), &json!("a")));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!("   "))));
        assert!(!is_blank(Some(&json!("x"))));
        assert!(!is_blank(Some(&json!(0))));
    }

    #[test]
    fn non_finite_has_no_value() {
        assert!(from_f64(f64::NAN).is_none());
        assert_eq!(from_f64(1.5), Some(json!(1.5)));
    }
}
