//! Validation rule engine: loads rules through the [`MetadataStore`] and
//! runs them in a deterministic order.

use std::sync::Arc;

use serde_json::Value;

use super::evaluator::{build_context, evaluate_field_rule, evaluate_scoped_rule};
use super::rules::{ErrorLevel, RuleScope, ValidationError};
use crate::error::CoreError;
use crate::expression::Interpreter;
use crate::metadata::{EntityDefinition, WorkflowTransition};
use crate::store::MetadataStore;
use crate::types::Context;

/// Trigger used for single-field validation.
pub const TRIGGER_UPDATE: &str = "UPDATE";

/// Trigger used for rules run before a workflow transition.
pub const TRIGGER_TRANSITION: &str = "TRANSITION";

pub struct ValidationEngine {
    metadata: Arc<dyn MetadataStore>,
    interpreter: Interpreter,
}

impl ValidationEngine {
    pub fn new(metadata: Arc<dyn MetadataStore>, interpreter: Interpreter) -> Self {
        Self {
            metadata,
            interpreter,
        }
    }

    /// Validate a record against every applicable rule.
    ///
    /// FIELD rules run first, property by property in entity order, then
    /// ENTITY rules, then CROSS_ENTITY rules. The returned list preserves
    /// that order; empty means valid. Only a missing entity or a failing
    /// store is an `Err`.
    pub fn validate_record(
        &self,
        entity_id: &str,
        data: &Context,
        trigger_event: &str,
        previous: Option<&Context>,
    ) -> Result<Vec<ValidationError>, CoreError> {
        let entity = self.entity(entity_id)?;
        self.validate_with(&entity, data, trigger_event, previous)
    }

    /// Validate one property as if `value` were written into `full_record`.
    ///
    /// Only that property's FIELD rules run, with trigger `UPDATE`.
    pub fn validate_field(
        &self,
        entity_id: &str,
        property_name: &str,
        value: Value,
        full_record: &Context,
    ) -> Result<Vec<ValidationError>, CoreError> {
        let entity = self.entity(entity_id)?;
        let property = entity
            .property(property_name)
            .ok_or_else(|| CoreError::not_found("PropertyDefinition", property_name))?;

        let mut data = full_record.clone();
        data.insert(property_name.to_string(), value);
        let context = build_context(&entity, &data, None, TRIGGER_UPDATE);

        let errors = self
            .metadata
            .field_rules(entity_id, property_name)?
            .iter()
            .filter(|rule| rule.applies_to(TRIGGER_UPDATE))
            .filter_map(|rule| {
                evaluate_field_rule(&self.interpreter, rule, property, &data, &context)
            })
            .collect();
        Ok(errors)
    }

    /// Preconditions of a workflow transition, in order: the transition's
    /// condition expressions, WORKFLOW_TRANSITION rules, then the regular
    /// record rules with trigger `TRANSITION`.
    pub fn validate_transition(
        &self,
        entity: &EntityDefinition,
        transition: &WorkflowTransition,
        data: &Context,
    ) -> Result<Vec<ValidationError>, CoreError> {
        let context = build_context(entity, data, Some(data), TRIGGER_TRANSITION);
        let mut errors = Vec::new();

        for condition in transition.conditions.iter().filter(|c| !c.trim().is_empty()) {
            if !self.interpreter.evaluate_boolean(condition, &context) {
                errors.push(ValidationError {
                    rule_id: transition.transition_id,
                    property_name: None,
                    message: format!("Transition condition not met: {condition}"),
                    message_key: None,
                    level: ErrorLevel::WorkflowTransition,
                });
            }
        }

        let transition_id = transition.transition_id.to_string();
        for rule in self
            .metadata
            .scope_rules(&entity.entity_id, RuleScope::WorkflowTransition)?
            .iter()
            .filter(|r| r.applies_to(TRIGGER_TRANSITION) || r.applies_to(&transition_id))
        {
            errors.extend(evaluate_scoped_rule(
                &self.interpreter,
                rule,
                ErrorLevel::WorkflowTransition,
                &context,
            ));
        }

        errors.extend(self.validate_with(entity, data, TRIGGER_TRANSITION, Some(data))?);
        Ok(errors)
    }

    fn validate_with(
        &self,
        entity: &EntityDefinition,
        data: &Context,
        trigger_event: &str,
        previous: Option<&Context>,
    ) -> Result<Vec<ValidationError>, CoreError> {
        let entity_id = entity.entity_id.as_str();
        let context = build_context(entity, data, previous, trigger_event);
        let mut errors = Vec::new();

        for property in &entity.properties {
            for rule in self.metadata.field_rules(entity_id, &property.property_name)? {
                if rule.applies_to(trigger_event) {
                    errors.extend(evaluate_field_rule(
                        &self.interpreter,
                        &rule,
                        property,
                        data,
                        &context,
                    ));
                }
            }
        }

        for (scope, level) in [
            (RuleScope::Entity, ErrorLevel::Entity),
            (RuleScope::CrossEntity, ErrorLevel::CrossEntity),
        ] {
            for rule in self.metadata.scope_rules(entity_id, scope)? {
                if rule.applies_to(trigger_event) {
                    errors.extend(evaluate_scoped_rule(&self.interpreter, &rule, level, &context));
                }
            }
        }

        tracing::debug!(
            entity_id,
            trigger_event,
            error_count = errors.len(),
            "Record validated",
        );
        Ok(errors)
    }

    fn entity(&self, entity_id: &str) -> Result<EntityDefinition, CoreError> {
        self.metadata
            .entity(entity_id)?
            .ok_or_else(|| CoreError::not_found("EntityDefinition", entity_id))
    }
}
