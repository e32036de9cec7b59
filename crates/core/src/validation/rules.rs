//! Validation rule and result types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Context, DefinitionId};

/// A declarative check attached to a property, an entity, a cross-entity
/// relationship or a workflow transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub validation_id: Uuid,
    pub entity_id: DefinitionId,
    /// Set for FIELD rules only.
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub rule_name: Option<String>,
    pub scope: RuleScope,
    pub rule_type: RuleType,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_message_key: Option<String>,
    /// Empty means the rule runs on every trigger.
    #[serde(default)]
    pub trigger_events: Vec<String>,
    /// Type-specific settings: `min`/`max`, `minLength`/`maxLength`, `pattern`.
    #[serde(default)]
    pub metadata: Option<Context>,
}

impl ValidationRule {
    pub fn applies_to(&self, trigger_event: &str) -> bool {
        self.trigger_events.is_empty() || self.trigger_events.iter().any(|t| t == trigger_event)
    }

    /// Non-blank expression, if any.
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref()?.get(key).filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleScope {
    Field,
    Entity,
    CrossEntity,
    WorkflowTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Required,
    Type,
    Range,
    Length,
    Pattern,
    Expression,
    Custom,
}

/// Level at which a validation error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLevel {
    Field,
    Entity,
    CrossEntity,
    WorkflowTransition,
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub rule_id: Uuid,
    /// `None` above field level.
    pub property_name: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    pub level: ErrorLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_admin_json() {
        let rule: ValidationRule = serde_json::from_value(json!({
            "validationId": "6a2f41a0-6b8e-4a61-9d1f-0c3a4b5c6d7e",
            "entityId": "invoice",
            "propertyName": "amount",
            "scope": "FIELD",
            "ruleType": "RANGE",
            "triggerEvents": ["CREATE", "UPDATE"],
            "metadata": {"min": 0, "max": null}
        }))
        .unwrap();
        assert_eq!(rule.scope, RuleScope::Field);
        assert_eq!(rule.rule_type, RuleType::Range);
        assert_eq!(rule.setting("min"), Some(&json!(0)));
        assert_eq!(rule.setting("max"), None);
        assert!(rule.applies_to("UPDATE"));
        assert!(!rule.applies_to("DELETE"));
    }

    #[test]
    fn empty_triggers_always_apply() {
        let rule: ValidationRule = serde_json::from_value(json!({
            "validationId": "6a2f41a0-6b8e-4a61-9d1f-0c3a4b5c6d7e",
            "entityId": "invoice",
            "scope": "CROSS_ENTITY",
            "ruleType": "EXPRESSION",
            "expression": "  "
        }))
        .unwrap();
        assert!(rule.applies_to("ANYTHING"));
        assert_eq!(rule.expression(), None);
    }
}
