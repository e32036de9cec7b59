//! Workflow transition engine.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{check_from_state, current_state};
use crate::audit::{verify_chain, ChainBreak, NewAuditEntry, WorkflowAuditLogEntry};
use crate::error::CoreError;
use crate::expression::Interpreter;
use crate::metadata::{EntityDefinition, WorkflowTransition};
use crate::record::Record;
use crate::store::{
    AuditTrail, Authorizer, MetadataStore, RecordStore, StoreError, TransitionCommit,
};
use crate::types::{RecordId, Timestamp};
use crate::validation::ValidationEngine;

/// Outcome of a successful transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub entity_id: String,
    pub record_id: RecordId,
    pub from_state: String,
    pub to_state: String,
    pub transition_id: Uuid,
    pub transition_label: Option<String>,
    pub performed_by: String,
    pub performed_at: Timestamp,
    pub comments: Option<String>,
    pub audit_id: Uuid,
}

pub struct WorkflowEngine {
    metadata: Arc<dyn MetadataStore>,
    records: Arc<dyn RecordStore>,
    audit: Arc<dyn AuditTrail>,
    authorizer: Arc<dyn Authorizer>,
    validation: ValidationEngine,
}

impl WorkflowEngine {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        records: Arc<dyn RecordStore>,
        audit: Arc<dyn AuditTrail>,
        authorizer: Arc<dyn Authorizer>,
        interpreter: Interpreter,
    ) -> Self {
        let validation = ValidationEngine::new(Arc::clone(&metadata), interpreter);
        Self {
            metadata,
            records,
            audit,
            authorizer,
            validation,
        }
    }

    /// Execute `transition_id` on a record on behalf of `actor`.
    ///
    /// Nothing is written until every check has passed. The new state and
    /// its audit entry are then written by one
    /// [`RecordStore::commit_transition`] call guarded by the record version
    /// read at the start, so a concurrent change makes this call fail with
    /// [`CoreError::Conflict`] and write nothing. A rejected transition
    /// leaves a never-transitioned record without a state.
    pub fn execute_transition(
        &self,
        entity_id: &str,
        record_id: RecordId,
        transition_id: Uuid,
        comments: Option<&str>,
        actor: &str,
    ) -> Result<TransitionResult, CoreError> {
        let entity = self.entity(entity_id)?;
        let workflow_id = entity.workflow().ok_or_else(|| CoreError::NoWorkflow {
            entity_id: entity_id.to_string(),
        })?;
        let record = self.record(entity_id, record_id)?;
        let workflow = self
            .metadata
            .workflow(workflow_id)?
            .ok_or_else(|| CoreError::not_found("WorkflowDefinition", workflow_id))?;
        let transition = self
            .metadata
            .transition(transition_id)?
            .ok_or_else(|| CoreError::not_found("WorkflowTransition", transition_id))?;

        if transition.workflow_id != workflow.workflow_id {
            return Err(CoreError::InvalidTransition {
                transition_id,
                workflow_id: workflow.workflow_id.clone(),
            });
        }

        // A record with no state sits in the initial state; the commit below
        // writes its first stored state.
        let from_state = current_state(&record, &workflow).name().to_string();
        check_from_state(&transition, &from_state)?;

        self.authorize(&transition, actor)?;
        self.check_preconditions(&entity, &transition, &record)?;

        let performed_at = Utc::now();
        let commit = TransitionCommit {
            entity_id: entity_id.to_string(),
            record_id,
            expected_version: record.version,
            to_state: transition.to_state.clone(),
            updated_by: actor.to_string(),
            updated_at: performed_at,
            audit: NewAuditEntry {
                entity_id: entity_id.to_string(),
                record_id,
                workflow_id: workflow.workflow_id.clone(),
                transition_id,
                transition_label: transition.action_label.clone(),
                from_state: from_state.clone(),
                to_state: transition.to_state.clone(),
                performed_by: actor.to_string(),
                performed_at,
                comments: comments.map(String::from),
            },
        };
        let (_, entry) = self
            .records
            .commit_transition(&commit)
            .map_err(|e| conflict_or_store(e, record_id, transition_id))?;

        tracing::info!(
            entity_id,
            record_id = %record_id,
            from_state = %from_state,
            to_state = %transition.to_state,
            transition_id = %transition_id,
            actor,
            "Workflow transition executed",
        );

        Ok(TransitionResult {
            entity_id: entity_id.to_string(),
            record_id,
            from_state,
            to_state: transition.to_state,
            transition_id,
            transition_label: transition.action_label,
            performed_by: actor.to_string(),
            performed_at,
            comments: comments.map(String::from),
            audit_id: entry.audit_id,
        })
    }

    /// Transitions leaving the record's current state, in declaration order.
    ///
    /// Read-only: a record without a state is reported from the initial
    /// state but nothing is written. Entities without a workflow have none.
    pub fn available_transitions(
        &self,
        entity_id: &str,
        record_id: RecordId,
    ) -> Result<Vec<WorkflowTransition>, CoreError> {
        let entity = self.entity(entity_id)?;
        let Some(workflow_id) = entity.workflow() else {
            return Ok(Vec::new());
        };
        let record = self.record(entity_id, record_id)?;
        let Some(workflow) = self.metadata.workflow(workflow_id)? else {
            tracing::warn!(entity_id, workflow_id, "Workflow referenced by entity not found");
            return Ok(Vec::new());
        };

        let state = current_state(&record, &workflow).name();
        Ok(workflow.transitions_from(state).cloned().collect())
    }

    /// The record's audit entries, newest first.
    pub fn audit_log(
        &self,
        entity_id: &str,
        record_id: RecordId,
    ) -> Result<Vec<WorkflowAuditLogEntry>, CoreError> {
        Ok(self.audit.entries_for_record(entity_id, record_id)?)
    }

    /// Recompute the record's audit hash chain. `Ok(None)` means intact.
    pub fn verify_audit_log(
        &self,
        entity_id: &str,
        record_id: RecordId,
    ) -> Result<Option<ChainBreak>, CoreError> {
        let mut entries = self.audit_log(entity_id, record_id)?;
        entries.reverse();
        Ok(verify_chain(&entries).err())
    }

    fn authorize(&self, transition: &WorkflowTransition, actor: &str) -> Result<(), CoreError> {
        if transition.allowed_roles.is_empty()
            || self.authorizer.has_any_role(actor, &transition.allowed_roles)?
        {
            return Ok(());
        }
        Err(CoreError::Forbidden {
            transition_id: transition.transition_id,
            actor: actor.to_string(),
        })
    }

    fn check_preconditions(
        &self,
        entity: &EntityDefinition,
        transition: &WorkflowTransition,
        record: &Record,
    ) -> Result<(), CoreError> {
        let errors = self
            .validation
            .validate_transition(entity, transition, &record.data)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::PreconditionFailed {
                transition_id: transition.transition_id,
                errors,
            })
        }
    }

    fn entity(&self, entity_id: &str) -> Result<EntityDefinition, CoreError> {
        self.metadata
            .entity(entity_id)?
            .ok_or_else(|| CoreError::not_found("EntityDefinition", entity_id))
    }

    fn record(&self, entity_id: &str, record_id: RecordId) -> Result<Record, CoreError> {
        self.records
            .record(entity_id, record_id)?
            .ok_or_else(|| CoreError::not_found("Record", record_id))
    }
}

fn conflict_or_store(error: StoreError, record_id: RecordId, transition_id: Uuid) -> CoreError {
    match error {
        StoreError::VersionConflict { .. } => {
            tracing::warn!(record_id = %record_id, transition_id = %transition_id, "Lost transition race");
            CoreError::Conflict {
                record_id,
                transition_id,
            }
        }
        other => CoreError::Store(other),
    }
}
