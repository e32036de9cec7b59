//! In-memory tables behind the repositories.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use cbap_core::audit::WorkflowAuditLogEntry;
use cbap_core::metadata::{EntityDefinition, Measure, WorkflowDefinition, WorkflowTransition};
use cbap_core::record::Record;
use cbap_core::types::RecordId;
use cbap_core::validation::ValidationRule;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct Tables {
    pub entities: BTreeMap<String, EntityDefinition>,
    /// In declaration order.
    pub rules: Vec<ValidationRule>,
    /// Keyed by `(identifier, version)` so versions of one measure are adjacent
    /// and ascending.
    pub measures: BTreeMap<(String, i32), Measure>,
    pub workflows: BTreeMap<String, WorkflowDefinition>,
    pub transitions: HashMap<Uuid, WorkflowTransition>,
    pub records: BTreeMap<RecordId, Record>,
    /// Append-only, oldest first.
    pub audit: Vec<WorkflowAuditLogEntry>,
    pub roles: BTreeMap<String, BTreeSet<String>>,
}

impl Tables {
    /// Hash of the newest audit entry for a record.
    pub fn last_audit_hash(&self, record_id: RecordId) -> Option<&str> {
        self.audit
            .iter()
            .rev()
            .find(|e| e.record_id == record_id)
            .map(|e| e.integrity_hash.as_str())
    }
}
