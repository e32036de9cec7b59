//! Workflow definitions: states and the directed transitions between them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::DefinitionId;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[validate(length(min = 1, max = 100))]
    pub workflow_id: DefinitionId,
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub initial_state: String,
    #[serde(default)]
    #[validate(nested)]
    pub states: Vec<WorkflowState>,
    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowDefinition {
    pub fn state(&self, name: &str) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.state_name == name)
    }

    /// Transitions whose source is `state`, in declaration order.
    pub fn transitions_from<'a>(
        &'a self,
        state: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowTransition> + 'a {
        self.transitions.iter().filter(move |t| t.from_state == state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    #[validate(length(min = 1, max = 100))]
    pub state_name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
}

/// A directed edge `from_state -> to_state`, optionally gated by roles and
/// condition expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTransition {
    pub transition_id: Uuid,
    pub workflow_id: DefinitionId,
    pub from_state: String,
    pub to_state: String,
    #[serde(default)]
    pub action_label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Empty means any actor may execute the transition.
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    /// Boolean expressions evaluated against the record before the move.
    #[serde(default)]
    pub conditions: Vec<String>,
}
