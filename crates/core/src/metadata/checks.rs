//! Structural checks on definitions, run when they are loaded.

use std::collections::HashSet;

use validator::Validate;

use super::entity::{EntityDefinition, PropertyType};
use super::measure::Measure;
use super::workflow::WorkflowDefinition;
use crate::error::CoreError;

/// Entity definitions must have unique, non-empty property names and every
/// `calculated` property must carry an expression.
pub fn check_entity(entity: &EntityDefinition) -> Result<(), CoreError> {
    entity
        .validate()
        .map_err(|e| invalid(format!("entity '{}': {e}", entity.entity_id)))?;

    let mut seen = HashSet::new();
    for property in &entity.properties {
        if !seen.insert(property.property_name.as_str()) {
            return Err(invalid(format!(
                "entity '{}' declares property '{}' twice",
                entity.entity_id, property.property_name
            )));
        }
        let has_calculation = property
            .calculation
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if property.property_type == PropertyType::Calculated && !has_calculation {
            return Err(invalid(format!(
                "calculated property '{}.{}' has no calculation",
                entity.entity_id, property.property_name
            )));
        }
    }
    Ok(())
}

pub fn check_measure(measure: &Measure) -> Result<(), CoreError> {
    measure.validate().map_err(|e| {
        invalid(format!(
            "measure '{}' version {}: {e}",
            measure.identifier, measure.version
        ))
    })
}

/// Workflow definitions must form a closed state machine:
///
/// - `initial_state` is a declared state
/// - at most one state is flagged initial, and it is `initial_state`
/// - every transition connects declared states and belongs to this workflow
/// - no transition leaves a final state
pub fn check_workflow(workflow: &WorkflowDefinition) -> Result<(), CoreError> {
    let id = &workflow.workflow_id;
    workflow
        .validate()
        .map_err(|e| invalid(format!("workflow '{id}': {e}")))?;

    if workflow.state(&workflow.initial_state).is_none() {
        return Err(invalid(format!(
            "workflow '{id}' initial state '{}' is not declared",
            workflow.initial_state
        )));
    }

    let flagged: Vec<&str> = workflow
        .states
        .iter()
        .filter(|s| s.is_initial)
        .map(|s| s.state_name.as_str())
        .collect();
    match flagged.as_slice() {
        [] => {}
        [only] if *only == workflow.initial_state => {}
        [only] => {
            return Err(invalid(format!(
                "workflow '{id}' flags '{only}' as initial but initial state is '{}'",
                workflow.initial_state
            )))
        }
        _ => {
            return Err(invalid(format!(
                "workflow '{id}' flags {} states as initial",
                flagged.len()
            )))
        }
    }

    for t in &workflow.transitions {
        if t.workflow_id != *id {
            return Err(invalid(format!(
                "transition {} belongs to workflow '{}', not '{id}'",
                t.transition_id, t.workflow_id
            )));
        }
        for state in [&t.from_state, &t.to_state] {
            if workflow.state(state).is_none() {
                return Err(invalid(format!(
                    "transition {} references undeclared state '{state}'",
                    t.transition_id
                )));
            }
        }
        if workflow.state(&t.from_state).is_some_and(|s| s.is_final) {
            return Err(invalid(format!(
                "transition {} leaves final state '{}'",
                t.transition_id, t.from_state
            )));
        }
    }
    Ok(())
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidArgument(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::entity::PropertyDefinition;
    use crate::metadata::workflow::{WorkflowState, WorkflowTransition};
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn state(name: &str, is_initial: bool, is_final: bool) -> WorkflowState {
        WorkflowState {
            state_name: name.into(),
            label: None,
            is_initial,
            is_final,
        }
    }

    fn transition(from: &str, to: &str) -> WorkflowTransition {
        WorkflowTransition {
            transition_id: Uuid::new_v4(),
            workflow_id: "approval".into(),
            from_state: from.into(),
            to_state: to.into(),
            action_label: None,
            description: None,
            allowed_roles: vec![],
            conditions: vec![],
        }
    }

    fn workflow() -> WorkflowDefinition {
        WorkflowDefinition {
            workflow_id: "approval".into(),
            name: None,
            initial_state: "draft".into(),
            states: vec![
                state("draft", true, false),
                state("submitted", false, false),
                state("approved", false, true),
            ],
            transitions: vec![
                transition("draft", "submitted"),
                transition("submitted", "approved"),
            ],
        }
    }

    fn property(name: &str, property_type: PropertyType) -> PropertyDefinition {
        PropertyDefinition {
            property_name: name.into(),
            label: None,
            property_type,
            required: false,
            read_only: false,
            denormalize: false,
            calculation: None,
        }
    }

    #[test]
    fn well_formed_workflow_passes() {
        assert!(check_workflow(&workflow()).is_ok());
    }

    #[test]
    fn undeclared_initial_state_rejected() {
        let mut wf = workflow();
        wf.initial_state = "nowhere".into();
        assert_matches!(check_workflow(&wf), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn conflicting_initial_flag_rejected() {
        let mut wf = workflow();
        wf.states[1].is_initial = true;
        assert_matches!(check_workflow(&wf), Err(CoreError::InvalidArgument(_)));

        let mut wf = workflow();
        wf.states[0].is_initial = false;
        wf.states[1].is_initial = true;
        assert_matches!(check_workflow(&wf), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn transition_out_of_final_state_rejected() {
        let mut wf = workflow();
        wf.transitions.push(transition("approved", "draft"));
        let err = check_workflow(&wf).unwrap_err();
        assert!(err.to_string().contains("final state 'approved'"));
    }

    #[test]
    fn transition_to_undeclared_state_rejected() {
        let mut wf = workflow();
        wf.transitions.push(transition("draft", "archived"));
        assert_matches!(check_workflow(&wf), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn duplicate_property_rejected() {
        let entity = EntityDefinition {
            entity_id: "invoice".into(),
            name: "Invoice".into(),
            properties: vec![
                property("amount", PropertyType::Number),
                property("amount", PropertyType::String),
            ],
            workflow_id: None,
        };
        let err = check_entity(&entity).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn empty_property_name_rejected() {
        let entity = EntityDefinition {
            entity_id: "invoice".into(),
            name: "Invoice".into(),
            properties: vec![property("", PropertyType::Number)],
            workflow_id: None,
        };
        assert_matches!(check_entity(&entity), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn calculated_property_needs_expression() {
        let mut total = property("total", PropertyType::Calculated);
        let entity = EntityDefinition {
            entity_id: "invoice".into(),
            name: "Invoice".into(),
            properties: vec![total.clone()],
            workflow_id: None,
        };
        assert!(check_entity(&entity).is_err());

        total.calculation = Some("net + tax".into());
        let entity = EntityDefinition {
            properties: vec![total],
            ..entity
        };
        assert!(check_entity(&entity).is_ok());
    }
}
