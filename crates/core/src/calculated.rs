//! Calculated property values.

use serde_json::Value;

use crate::expression::Interpreter;
use crate::metadata::{EntityDefinition, PropertyType};
use crate::types::Context;

/// Evaluate every `calculated` property of `entity` and write the results
/// into `data`, in property order.
///
/// All expressions see the record as it was on entry (flattened plus `this`)
/// and, when given, the parent record as `parent` and `$parent`. A failing
/// expression is logged and leaves its property untouched.
///
/// Returns the names of the properties that were written.
pub fn compute_calculated_fields(
    interpreter: &Interpreter,
    entity: &EntityDefinition,
    data: &mut Context,
    parent: Option<&Context>,
) -> Vec<String> {
    let context = calculation_context(data, parent);
    let mut written = Vec::new();

    for property in &entity.properties {
        if property.property_type != PropertyType::Calculated {
            continue;
        }
        let Some(expression) = property.calculation.as_deref() else {
            continue;
        };
        match interpreter.evaluate(expression, &context) {
            Ok(result) => {
                tracing::debug!(
                    entity_id = %entity.entity_id,
                    property = %property.property_name,
                    "Computed calculated field",
                );
                data.insert(property.property_name.clone(), result);
                written.push(property.property_name.clone());
            }
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity.entity_id,
                    property = %property.property_name,
                    expression,
                    error = %e,
                    "Failed to compute calculated field",
                );
            }
        }
    }
    written
}

fn calculation_context(data: &Context, parent: Option<&Context>) -> Context {
    let mut context = data.clone();
    context.insert("this".into(), Value::Object(data.clone()));
    if let Some(parent) = parent {
        context.insert("parent".into(), Value::Object(parent.clone()));
        context.insert("$parent".into(), Value::Object(parent.clone()));
    }
    context
}
