//! Workflow audit entries and their integrity hash chain.
//!
//! Every successful transition appends exactly one entry. Entries for one
//! record form a chain: each `integrity_hash` covers the entry's canonical
//! payload and the previous entry's hash, so editing or dropping an entry
//! breaks every hash after it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hashing;
use crate::types::{DefinitionId, RecordId, Timestamp};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Audit entry as produced by the workflow engine, before the record store
/// assigns an id and seals it into the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub entity_id: DefinitionId,
    pub record_id: RecordId,
    pub workflow_id: DefinitionId,
    pub transition_id: Uuid,
    pub transition_label: Option<String>,
    pub from_state: String,
    pub to_state: String,
    pub performed_by: String,
    pub performed_at: Timestamp,
    pub comments: Option<String>,
}

/// Immutable, stored audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAuditLogEntry {
    pub audit_id: Uuid,
    pub entity_id: DefinitionId,
    pub record_id: RecordId,
    pub workflow_id: DefinitionId,
    pub transition_id: Uuid,
    pub transition_label: Option<String>,
    pub from_state: String,
    pub to_state: String,
    pub performed_by: String,
    pub performed_at: Timestamp,
    pub comments: Option<String>,
    pub integrity_hash: String,
}

impl NewAuditEntry {
    /// Assign `audit_id` and chain the entry onto `prev_hash`, the hash of
    /// the record's newest stored entry (`None` for its first).
    pub fn seal(self, audit_id: Uuid, prev_hash: Option<&str>) -> WorkflowAuditLogEntry {
        let integrity_hash = compute_integrity_hash(prev_hash, &canonical_payload(&self));
        WorkflowAuditLogEntry {
            audit_id,
            entity_id: self.entity_id,
            record_id: self.record_id,
            workflow_id: self.workflow_id,
            transition_id: self.transition_id,
            transition_label: self.transition_label,
            from_state: self.from_state,
            to_state: self.to_state,
            performed_by: self.performed_by,
            performed_at: self.performed_at,
            comments: self.comments,
            integrity_hash,
        }
    }
}

impl WorkflowAuditLogEntry {
    fn unsealed(&self) -> NewAuditEntry {
        NewAuditEntry {
            entity_id: self.entity_id.clone(),
            record_id: self.record_id,
            workflow_id: self.workflow_id.clone(),
            transition_id: self.transition_id,
            transition_label: self.transition_label.clone(),
            from_state: self.from_state.clone(),
            to_state: self.to_state.clone(),
            performed_by: self.performed_by.clone(),
            performed_at: self.performed_at,
            comments: self.comments.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in each record's chain.
const CHAIN_SEED: &str = "WORKFLOW_AUDIT_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for an audit entry.
///
/// `prev_hash` is the integrity_hash of the previous entry, or `None` for the
/// first entry in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Canonical string form of an entry: a JSON object with sorted keys and
/// RFC 3339 timestamps.
pub fn canonical_payload(entry: &NewAuditEntry) -> String {
    serde_json::json!({
        "entityId": entry.entity_id,
        "recordId": entry.record_id.to_string(),
        "workflowId": entry.workflow_id,
        "transitionId": entry.transition_id.to_string(),
        "transitionLabel": entry.transition_label,
        "fromState": entry.from_state,
        "toState": entry.to_state,
        "performedBy": entry.performed_by,
        "performedAt": entry.performed_at.to_rfc3339(),
        "comments": entry.comments,
    })
    .to_string()
}

/// First entry whose stored hash does not match its recomputed hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Audit chain broken at position {position} (entry {audit_id})")]
pub struct ChainBreak {
    pub position: usize,
    pub audit_id: Uuid,
}

/// Recompute the chain over one record's entries, oldest first.
pub fn verify_chain(entries: &[WorkflowAuditLogEntry]) -> Result<(), ChainBreak> {
    let mut prev: Option<&str> = None;
    for (position, entry) in entries.iter().enumerate() {
        let expected = compute_integrity_hash(prev, &canonical_payload(&entry.unsealed()));
        if expected != entry.integrity_hash {
            return Err(ChainBreak {
                position,
                audit_id: entry.audit_id,
            });
        }
        prev = Some(&entry.integrity_hash);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
