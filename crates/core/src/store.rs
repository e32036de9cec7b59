//! Collaborator traits the engines are written against.
//!
//! Implementations own persistence, caching, role membership and audit
//! storage. Every call is synchronous and may be made from any thread.

use uuid::Uuid;

use crate::audit::{NewAuditEntry, WorkflowAuditLogEntry};
use crate::metadata::{EntityDefinition, Measure, WorkflowDefinition, WorkflowTransition};
use crate::record::Record;
use crate::types::{RecordId, Timestamp};
use crate::validation::rules::{RuleScope, ValidationRule};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record {record_id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        record_id: RecordId,
        expected: i64,
        actual: i64,
    },

    #[error("Record {record_id} not found")]
    RecordNotFound { record_id: RecordId },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Read access to admin-authored definitions.
pub trait MetadataStore: Send + Sync {
    fn entity(&self, entity_id: &str) -> Result<Option<EntityDefinition>, StoreError>;

    /// FIELD-scope rules attached to one property, in rule order.
    fn field_rules(
        &self,
        entity_id: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationRule>, StoreError>;

    /// Rules of a non-field scope for the entity, in rule order.
    fn scope_rules(&self, entity_id: &str, scope: RuleScope)
        -> Result<Vec<ValidationRule>, StoreError>;

    fn measure(&self, identifier: &str, version: i32) -> Result<Option<Measure>, StoreError>;

    /// Highest version of the measure.
    fn latest_measure(&self, identifier: &str) -> Result<Option<Measure>, StoreError>;

    /// Known versions, ascending.
    fn measure_versions(&self, identifier: &str) -> Result<Vec<i32>, StoreError>;

    fn workflow(&self, workflow_id: &str) -> Result<Option<WorkflowDefinition>, StoreError>;

    fn transition(&self, transition_id: Uuid) -> Result<Option<WorkflowTransition>, StoreError>;
}

/// Everything a transition writes, committed together or not at all.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub entity_id: String,
    pub record_id: RecordId,
    /// The version read before the checks ran.
    pub expected_version: i64,
    pub to_state: String,
    pub updated_by: String,
    pub updated_at: Timestamp,
    pub audit: NewAuditEntry,
}

/// Record persistence.
///
/// The transition write is compare-and-set on [`Record::version`]: when the
/// stored version differs from `expected_version` nothing is written and
/// [`StoreError::VersionConflict`] is returned.
pub trait RecordStore: Send + Sync {
    fn record(&self, entity_id: &str, record_id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Write the new state and append the sealed audit entry in one
    /// transaction.
    fn commit_transition(
        &self,
        commit: &TransitionCommit,
    ) -> Result<(Record, WorkflowAuditLogEntry), StoreError>;
}

/// Append-only audit storage.
pub trait AuditTrail: Send + Sync {
    /// Entries for one record, newest first.
    fn entries_for_record(
        &self,
        entity_id: &str,
        record_id: RecordId,
    ) -> Result<Vec<WorkflowAuditLogEntry>, StoreError>;
}

/// Role membership.
pub trait Authorizer: Send + Sync {
    fn has_any_role(&self, actor: &str, roles: &[String]) -> Result<bool, StoreError>;
}
