//! Append-only workflow audit entries.

use cbap_core::audit::WorkflowAuditLogEntry;
use cbap_core::store::{AuditTrail, StoreError};
use cbap_core::types::RecordId;

use crate::{read, Shared};

/// Entries are only appended by
/// [`RecordRepo::commit_transition`](crate::repositories::RecordRepo); this
/// repository reads them.
pub struct AuditRepo {
    tables: Shared,
}

impl AuditRepo {
    pub(crate) fn new(tables: Shared) -> Self {
        Self { tables }
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.tables)?.audit.len())
    }
}

impl AuditTrail for AuditRepo {
    fn entries_for_record(
        &self,
        entity_id: &str,
        record_id: RecordId,
    ) -> Result<Vec<WorkflowAuditLogEntry>, StoreError> {
        Ok(read(&self.tables)?
            .audit
            .iter()
            .rev()
            .filter(|e| e.record_id == record_id && e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
