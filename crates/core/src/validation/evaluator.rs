//! Rule evaluator: pure logic, no store access.
//!
//! A rule either passes, is violated (reported with its configured or
//! default message) or faults while being evaluated. Faults become errors
//! too, so one broken rule never stops its siblings.

use regex::Regex;
use serde_json::Value;

use super::rules::{ErrorLevel, RuleType, ValidationError, ValidationRule};
use crate::expression::Interpreter;
use crate::metadata::{EntityDefinition, PropertyDefinition};
use crate::types::Context;
use crate::value::{is_blank, to_number, truthy};

/// `Ok(Some(suffix))` is a violation; the suffix completes the default
/// message after the property's display name.
type Check = Result<Option<&'static str>, String>;

/// Build the context rules are evaluated against.
///
/// Record fields are flattened into the root alongside `this`, `previous`
/// (null when absent), `triggerEvent`, `entityId` and `entityName`.
pub fn build_context(
    entity: &EntityDefinition,
    data: &Context,
    previous: Option<&Context>,
    trigger_event: &str,
) -> Context {
    let mut context = data.clone();
    context.insert("this".into(), Value::Object(data.clone()));
    context.insert(
        "previous".into(),
        previous.map_or(Value::Null, |p| Value::Object(p.clone())),
    );
    context.insert("triggerEvent".into(), Value::from(trigger_event));
    context.insert("entityId".into(), Value::from(entity.entity_id.as_str()));
    context.insert("entityName".into(), Value::from(entity.name.as_str()));
    context
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

/// Evaluate one FIELD rule against the property's value in `data`.
pub fn evaluate_field_rule(
    interpreter: &Interpreter,
    rule: &ValidationRule,
    property: &PropertyDefinition,
    data: &Context,
    context: &Context,
) -> Option<ValidationError> {
    let value = data.get(&property.property_name);

    let check = match rule.rule_type {
        RuleType::Required => check_required(value),
        RuleType::Type => check_type(property, value),
        RuleType::Range => check_range(rule, value),
        RuleType::Length => check_length(rule, value),
        RuleType::Pattern => check_pattern(rule, value),
        RuleType::Expression => check_expression(interpreter, rule, property, value, context),
        RuleType::Custom => {
            tracing::warn!(rule_id = %rule.validation_id, "Unsupported rule type: CUSTOM");
            Ok(None)
        }
    };

    match check {
        Ok(None) => None,
        Ok(Some(suffix)) => Some(ValidationError {
            rule_id: rule.validation_id,
            property_name: Some(property.property_name.clone()),
            message: rule
                .error_message
                .clone()
                .unwrap_or_else(|| format!("{} {suffix}", property.display_name())),
            message_key: rule.error_message_key.clone(),
            level: ErrorLevel::Field,
        }),
        Err(reason) => {
            tracing::warn!(
                rule_id = %rule.validation_id,
                property = %property.property_name,
                error = %reason,
                "Error evaluating validation rule",
            );
            Some(ValidationError {
                rule_id: rule.validation_id,
                property_name: Some(property.property_name.clone()),
                message: format!("Validation error: {reason}"),
                message_key: None,
                level: ErrorLevel::Field,
            })
        }
    }
}

fn check_required(value: Option<&Value>) -> Check {
    Ok(is_blank(value).then_some("is required"))
}

fn check_type(property: &PropertyDefinition, value: Option<&Value>) -> Check {
    match value {
        Some(v) if !v.is_null() && !property.property_type.accepts(v) => Ok(Some("has invalid type")),
        _ => Ok(None),
    }
}

fn check_range(rule: &ValidationRule, value: Option<&Value>) -> Check {
    let Some(n) = value.and_then(to_number) else {
        return Ok(None);
    };
    if let Some(min) = numeric_setting(rule, "min")? {
        if n < min {
            return Ok(Some("is below minimum"));
        }
    }
    if let Some(max) = numeric_setting(rule, "max")? {
        if n > max {
            return Ok(Some("is above maximum"));
        }
    }
    Ok(None)
}

fn check_length(rule: &ValidationRule, value: Option<&Value>) -> Check {
    let Some(s) = value.and_then(Value::as_str) else {
        return Ok(None);
    };
    let len = s.chars().count() as f64;
    if let Some(min) = numeric_setting(rule, "minLength")? {
        if len < min.trunc() {
            return Ok(Some("is too short"));
        }
    }
    if let Some(max) = numeric_setting(rule, "maxLength")? {
        if len > max.trunc() {
            return Ok(Some("is too long"));
        }
    }
    Ok(None)
}

fn check_pattern(rule: &ValidationRule, value: Option<&Value>) -> Check {
    let Some(s) = value.and_then(Value::as_str) else {
        return Ok(None);
    };
    let Some(pattern) = rule.setting("pattern") else {
        return Ok(None);
    };
    let pattern = pattern
        .as_str()
        .ok_or_else(|| "pattern setting is not a string".to_string())?;
    // The whole value must match.
    let re = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
    Ok((!re.is_match(s)).then_some("does not match required pattern"))
}

fn check_expression(
    interpreter: &Interpreter,
    rule: &ValidationRule,
    property: &PropertyDefinition,
    value: Option<&Value>,
    context: &Context,
) -> Check {
    let Some(expression) = rule.expression() else {
        return Ok(None);
    };
    let value = value.cloned().unwrap_or(Value::Null);
    let mut field_context = context.clone();
    field_context.insert(property.property_name.clone(), value.clone());
    field_context.insert("value".into(), value);
    Ok((!interpreter.evaluate_boolean(expression, &field_context)).then_some("validation failed"))
}

fn numeric_setting(rule: &ValidationRule, key: &str) -> Result<Option<f64>, String> {
    match rule.setting(key) {
        None => Ok(None),
        Some(v) => to_number(v)
            .map(Some)
            .ok_or_else(|| format!("{key} setting is not numeric")),
    }
}

// ---------------------------------------------------------------------------
// Entity, cross-entity and transition rules
// ---------------------------------------------------------------------------

/// Evaluate a rule whose expression covers the whole record.
///
/// A false or null result is a violation; an evaluation error is reported
/// with its message. Rules without an expression pass.
pub fn evaluate_scoped_rule(
    interpreter: &Interpreter,
    rule: &ValidationRule,
    level: ErrorLevel,
    context: &Context,
) -> Option<ValidationError> {
    let expression = rule.expression()?;
    let (message, message_key) = match interpreter.evaluate(expression, context) {
        Ok(result) if truthy(&result) => return None,
        Ok(_) => (
            rule.error_message
                .clone()
                .unwrap_or_else(|| default_scoped_message(level).to_string()),
            rule.error_message_key.clone(),
        ),
        Err(e) => {
            tracing::warn!(
                rule_id = %rule.validation_id,
                expression,
                error = %e,
                "Error evaluating validation rule",
            );
            (format!("Validation error: {e}"), None)
        }
    };
    Some(ValidationError {
        rule_id: rule.validation_id,
        property_name: None,
        message,
        message_key,
        level,
    })
}

fn default_scoped_message(level: ErrorLevel) -> &'static str {
    match level {
        ErrorLevel::Field | ErrorLevel::Entity => "Entity validation failed",
        ErrorLevel::CrossEntity => "Cross-entity validation failed",
        ErrorLevel::WorkflowTransition => "Transition validation failed",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
