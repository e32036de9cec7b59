//! Record storage with optimistic version checks.

use cbap_core::audit::WorkflowAuditLogEntry;
use cbap_core::record::Record;
use cbap_core::store::{RecordStore, StoreError, TransitionCommit};
use cbap_core::types::{Context, RecordId};
use chrono::Utc;
use uuid::Uuid;

use crate::models::Tables;
use crate::{read, write, Shared};

pub struct RecordRepo {
    tables: Shared,
}

impl RecordRepo {
    pub(crate) fn new(tables: Shared) -> Self {
        Self { tables }
    }

    /// Insert a new record with no workflow state at version 0.
    pub fn create(&self, entity_id: &str, data: Context) -> Result<Record, StoreError> {
        let mut tables = write(&self.tables)?;
        if !tables.entities.contains_key(entity_id) {
            return Err(StoreError::Backend(format!("unknown entity '{entity_id}'")));
        }
        let record = Record {
            record_id: Uuid::new_v4(),
            entity_id: entity_id.to_string(),
            data,
            state: None,
            version: 0,
            updated_by: None,
            updated_at: Some(Utc::now()),
        };
        tables.records.insert(record.record_id, record.clone());
        Ok(record)
    }

    pub fn list(&self, entity_id: &str) -> Result<Vec<Record>, StoreError> {
        Ok(read(&self.tables)?
            .records
            .values()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

/// Fetch a record for writing and check its version.
fn checked<'a>(
    tables: &'a mut Tables,
    entity_id: &str,
    record_id: RecordId,
    expected: i64,
) -> Result<&'a mut Record, StoreError> {
    let record = tables
        .records
        .get_mut(&record_id)
        .filter(|r| r.entity_id == entity_id)
        .ok_or(StoreError::RecordNotFound { record_id })?;
    if record.version != expected {
        return Err(StoreError::VersionConflict {
            record_id,
            expected,
            actual: record.version,
        });
    }
    Ok(record)
}

impl RecordStore for RecordRepo {
    fn record(&self, entity_id: &str, record_id: RecordId) -> Result<Option<Record>, StoreError> {
        Ok(read(&self.tables)?
            .records
            .get(&record_id)
            .filter(|r| r.entity_id == entity_id)
            .cloned())
    }

    fn commit_transition(
        &self,
        commit: &TransitionCommit,
    ) -> Result<(Record, WorkflowAuditLogEntry), StoreError> {
        let mut tables = write(&self.tables)?;

        let record = checked(
            &mut tables,
            &commit.entity_id,
            commit.record_id,
            commit.expected_version,
        )?;
        record.state = Some(commit.to_state.clone());
        record.updated_by = Some(commit.updated_by.clone());
        record.updated_at = Some(commit.updated_at);
        record.version += 1;
        let record = record.clone();

        let prev_hash = tables.last_audit_hash(commit.record_id).map(String::from);
        let entry = commit
            .audit
            .clone()
            .seal(Uuid::new_v4(), prev_hash.as_deref());
        tables.audit.push(entry.clone());

        Ok((record, entry))
    }
}
