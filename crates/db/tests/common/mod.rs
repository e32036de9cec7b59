//! Shared fixture: an `invoice` entity with an approval workflow, a few
//! validation rules and a versioned `tax` measure.

#![allow(dead_code)]

use std::sync::Arc;

use cbap_core::expression::Interpreter;
use cbap_core::measure::MeasureEvaluator;
use cbap_core::metadata::{
    EntityDefinition, Measure, MeasureParameter, PropertyDefinition, PropertyType, ReturnType,
    WorkflowDefinition, WorkflowState, WorkflowTransition,
};
use cbap_core::record::Record;
use cbap_core::types::Context;
use cbap_core::validation::{RuleScope, RuleType, ValidationEngine, ValidationRule};
use cbap_core::workflow::WorkflowEngine;
use cbap_db::models::Snapshot;
use cbap_db::Database;
use serde_json::{json, Value};
use uuid::Uuid;

pub const SUBMIT: Uuid = Uuid::from_u128(0x51);
pub const APPROVE: Uuid = Uuid::from_u128(0xa1);
pub const REJECT: Uuid = Uuid::from_u128(0x7e);
pub const REOPEN: Uuid = Uuid::from_u128(0x0e);

pub const NAME_REQUIRED: Uuid = Uuid::from_u128(0x1001);
pub const AMOUNT_RANGE: Uuid = Uuid::from_u128(0x1002);
pub const BALANCED: Uuid = Uuid::from_u128(0x1003);

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

pub fn ctx(value: Value) -> Context {
    value.as_object().cloned().unwrap()
}

fn property(name: &str, label: Option<&str>, property_type: PropertyType) -> PropertyDefinition {
    PropertyDefinition {
        property_name: name.to_string(),
        label: label.map(String::from),
        property_type,
        required: false,
        read_only: false,
        denormalize: false,
        calculation: None,
    }
}

pub fn invoice_entity() -> EntityDefinition {
    let mut total = property("total", None, PropertyType::Calculated);
    total.calculation = Some("sum(lines.amount)".to_string());
    EntityDefinition {
        entity_id: "invoice".to_string(),
        name: "Invoice".to_string(),
        properties: vec![
            property("name", Some("Name"), PropertyType::String),
            property("amount", Some("Amount"), PropertyType::Number),
            property("lines", None, PropertyType::Unknown),
            total,
        ],
        workflow_id: Some("approval".to_string()),
    }
}

pub fn rule(id: Uuid, scope: RuleScope, rule_type: RuleType) -> ValidationRule {
    ValidationRule {
        validation_id: id,
        entity_id: "invoice".to_string(),
        property_name: None,
        rule_name: None,
        scope,
        rule_type,
        expression: None,
        error_message: None,
        error_message_key: None,
        trigger_events: vec![],
        metadata: None,
    }
}

pub fn invoice_rules() -> Vec<ValidationRule> {
    let mut name_required = rule(NAME_REQUIRED, RuleScope::Field, RuleType::Required);
    name_required.property_name = Some("name".to_string());

    let mut amount_range = rule(AMOUNT_RANGE, RuleScope::Field, RuleType::Range);
    amount_range.property_name = Some("amount".to_string());
    amount_range.metadata = Some(ctx(json!({"min": 0, "max": 10000})));
    amount_range.trigger_events = vec!["CREATE".to_string(), "UPDATE".to_string()];

    vec![name_required, amount_range]
}

fn state(name: &str, is_initial: bool, is_final: bool) -> WorkflowState {
    WorkflowState {
        state_name: name.to_string(),
        label: None,
        is_initial,
        is_final,
    }
}

fn transition(id: Uuid, from: &str, to: &str, label: &str) -> WorkflowTransition {
    WorkflowTransition {
        transition_id: id,
        workflow_id: "approval".to_string(),
        from_state: from.to_string(),
        to_state: to.to_string(),
        action_label: Some(label.to_string()),
        description: None,
        allowed_roles: vec![],
        conditions: vec![],
    }
}

pub fn approval_workflow() -> WorkflowDefinition {
    let mut approve = transition(APPROVE, "submitted", "approved", "Approve");
    approve.allowed_roles = vec!["approver".to_string()];
    let mut submit = transition(SUBMIT, "draft", "submitted", "Submit");
    submit.conditions = vec!["amount > 0".to_string()];

    WorkflowDefinition {
        workflow_id: "approval".to_string(),
        name: Some("Invoice approval".to_string()),
        initial_state: "draft".to_string(),
        states: vec![
            state("draft", true, false),
            state("submitted", false, false),
            state("approved", false, true),
            state("rejected", false, false),
        ],
        transitions: vec![
            submit,
            approve,
            transition(REJECT, "submitted", "rejected", "Reject"),
            transition(REOPEN, "rejected", "draft", "Reopen"),
        ],
    }
}

pub fn tax_measures() -> Vec<Measure> {
    let v1 = Measure {
        identifier: "tax".to_string(),
        name: Some("Tax".to_string()),
        version: 1,
        parameters: vec![MeasureParameter {
            name: "base".to_string(),
            default: None,
        }],
        expression: "base * 0.5".to_string(),
        return_type: ReturnType::Number,
    };
    let v2 = Measure {
        version: 2,
        parameters: vec![
            MeasureParameter {
                name: "base".to_string(),
                default: None,
            },
            MeasureParameter {
                name: "rate".to_string(),
                default: Some(json!(0.25)),
            },
        ],
        expression: "$base * $rate".to_string(),
        ..v1.clone()
    };
    vec![v2, v1]
}

pub fn invoice(id: u128, state: Option<&str>, data: Value) -> Record {
    Record {
        record_id: Uuid::from_u128(id),
        entity_id: "invoice".to_string(),
        data: ctx(data),
        state: state.map(String::from),
        version: 0,
        updated_by: None,
        updated_at: None,
    }
}

pub fn snapshot(records: Vec<Record>) -> Snapshot {
    Snapshot {
        entities: vec![invoice_entity()],
        rules: invoice_rules(),
        measures: tax_measures(),
        workflows: vec![approval_workflow()],
        records,
        audit: vec![],
        roles: [("carol".to_string(), vec!["approver".to_string()])]
            .into_iter()
            .collect(),
    }
}

pub fn database(records: Vec<Record>) -> Database {
    Database::from_snapshot(snapshot(records)).unwrap()
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

pub fn validation_engine(db: &Database) -> ValidationEngine {
    ValidationEngine::new(Arc::new(db.metadata()), Interpreter::default())
}

pub fn measure_evaluator(db: &Database) -> MeasureEvaluator {
    MeasureEvaluator::new(Arc::new(db.metadata()), Interpreter::default())
}

pub fn workflow_engine(db: &Database) -> WorkflowEngine {
    WorkflowEngine::new(
        Arc::new(db.metadata()),
        Arc::new(db.records()),
        Arc::new(db.audit()),
        Arc::new(db.roles()),
        Interpreter::default(),
    )
}
