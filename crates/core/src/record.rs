//! Schema-less records and their workflow position.

use serde::{Deserialize, Serialize};

use crate::types::{Context, DefinitionId, RecordId, Timestamp};

/// A record instance: free-form data plus an optional workflow state.
///
/// `version` increases by one on every write the record store accepts and is
/// the optimistic-concurrency token for state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: RecordId,
    pub entity_id: DefinitionId,
    #[serde(default)]
    pub data: Context,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Where a record sits in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPosition<'a> {
    /// No state has ever been written.
    NeverTransitioned,
    At(&'a str),
}

impl Record {
    /// Empty and missing states both count as never transitioned.
    pub fn position(&self) -> WorkflowPosition<'_> {
        match self.state.as_deref() {
            None | Some("") => WorkflowPosition::NeverTransitioned,
            Some(state) => WorkflowPosition::At(state),
        }
    }
}
