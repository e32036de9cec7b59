//! Workflow state machine.
//!
//! A record's position is its `state` string. A record that has never been
//! transitioned is treated as sitting in the workflow's initial state;
//! [`current_state`] is the only place that decision is made.

pub mod engine;

use crate::error::CoreError;
use crate::metadata::{WorkflowDefinition, WorkflowTransition};
use crate::record::{Record, WorkflowPosition};

pub use engine::{TransitionResult, WorkflowEngine};

/// Resolved workflow state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentState<'a> {
    /// The record carries this state.
    Stored(&'a str),
    /// The record has no state yet; it is in the workflow's initial state,
    /// which has not been written.
    Initial(&'a str),
}

impl<'a> CurrentState<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            CurrentState::Stored(state) | CurrentState::Initial(state) => state,
        }
    }
}

pub fn current_state<'a>(record: &'a Record, workflow: &'a WorkflowDefinition) -> CurrentState<'a> {
    match record.position() {
        WorkflowPosition::At(state) => CurrentState::Stored(state),
        WorkflowPosition::NeverTransitioned => CurrentState::Initial(&workflow.initial_state),
    }
}

/// A transition may only be taken from its source state.
pub fn check_from_state(transition: &WorkflowTransition, current: &str) -> Result<(), CoreError> {
    if transition.from_state == current {
        Ok(())
    } else {
        Err(CoreError::IllegalState {
            transition_id: transition.transition_id,
            from_state: transition.from_state.clone(),
            current_state: current.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Context;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn workflow() -> WorkflowDefinition {
        WorkflowDefinition {
            workflow_id: "approval".into(),
            name: None,
            initial_state: "draft".into(),
            states: vec![],
            transitions: vec![],
        }
    }

    fn record(state: Option<&str>) -> Record {
        Record {
            record_id: Uuid::new_v4(),
            entity_id: "invoice".into(),
            data: Context::new(),
            state: state.map(String::from),
            version: 1,
            updated_by: None,
            updated_at: None,
        }
    }

    fn submit() -> WorkflowTransition {
        WorkflowTransition {
            transition_id: Uuid::new_v4(),
            workflow_id: "approval".into(),
            from_state: "draft".into(),
            to_state: "submitted".into(),
            action_label: Some("Submit".into()),
            description: None,
            allowed_roles: vec![],
            conditions: vec![],
        }
    }

    #[test]
    fn unset_state_defaults_to_initial() {
        let wf = workflow();
        let r = record(None);
        assert_eq!(current_state(&r, &wf), CurrentState::Initial("draft"));
        let r = record(Some(""));
        assert_eq!(current_state(&r, &wf).name(), "draft");
    }

    #[test]
    fn stored_state_wins() {
        let wf = workflow();
        let r = record(Some("submitted"));
        assert_eq!(current_state(&r, &wf), CurrentState::Stored("submitted"));
    }

    #[test]
    fn transition_only_from_source_state() {
        let t = submit();
        assert!(check_from_state(&t, "draft").is_ok());
        assert_matches!(
            check_from_state(&t, "approved"),
            Err(CoreError::IllegalState { ref current_state, .. }) if current_state == "approved"
        );
    }
}
