//! Serialized form of a whole database: definitions, records, audit history
//! and role membership.

use std::collections::BTreeMap;

use cbap_core::audit::WorkflowAuditLogEntry;
use cbap_core::metadata::{EntityDefinition, Measure, WorkflowDefinition};
use cbap_core::record::Record;
use cbap_core::validation::ValidationRule;
use serde::{Deserialize, Serialize};

/// JSON document loaded by [`Database::from_snapshot`](crate::Database::from_snapshot).
///
/// Workflow transitions are nested in their workflow. Rules keep the order
/// they are listed in, which is the order they run in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub workflows: Vec<WorkflowDefinition>,
    #[serde(default)]
    pub records: Vec<Record>,
    /// Audit entries, oldest first.
    #[serde(default)]
    pub audit: Vec<WorkflowAuditLogEntry>,
    /// Actor name to role names.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
}
