//! In-process persistence for the evaluation core.
//!
//! A [`Database`] holds every table behind one `RwLock`. Repositories are
//! cheap handles onto it and implement the `cbap_core::store` traits; a
//! write that must be atomic (a transition's state change plus its audit
//! entry) happens under a single write guard.

pub mod models;
pub mod repositories;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cbap_core::error::CoreError;
use cbap_core::metadata::{check_entity, check_measure, check_workflow};
use cbap_core::store::StoreError;

use models::{Snapshot, Tables};
use repositories::{AuditRepo, MetadataRepo, RecordRepo, RoleRepo};

pub(crate) type Shared = Arc<RwLock<Tables>>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid definition: {0}")]
    Definition(#[from] CoreError),

    #[error("Duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: Shared,
}

impl Database {
    /// Load and check a snapshot.
    ///
    /// Every definition passes the `cbap_core::metadata` checks, ids are
    /// unique, and records and rules reference known entities.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, DbError> {
        let mut tables = Tables::default();

        for entity in snapshot.entities {
            check_entity(&entity)?;
            let id = entity.entity_id.clone();
            if tables.entities.insert(id.clone(), entity).is_some() {
                return Err(DbError::Duplicate { kind: "entity", id });
            }
        }

        for rule in &snapshot.rules {
            if !tables.entities.contains_key(&rule.entity_id) {
                return Err(unknown_entity("rule", &rule.validation_id.to_string(), &rule.entity_id));
            }
        }
        tables.rules = snapshot.rules;

        for measure in snapshot.measures {
            check_measure(&measure)?;
            let key = (measure.identifier.clone(), measure.version);
            if tables.measures.contains_key(&key) {
                return Err(DbError::Duplicate {
                    kind: "measure",
                    id: format!("{} version {}", key.0, key.1),
                });
            }
            tables.measures.insert(key, measure);
        }

        for workflow in snapshot.workflows {
            check_workflow(&workflow)?;
            for transition in &workflow.transitions {
                let previous = tables
                    .transitions
                    .insert(transition.transition_id, transition.clone());
                if previous.is_some() {
                    return Err(DbError::Duplicate {
                        kind: "transition",
                        id: transition.transition_id.to_string(),
                    });
                }
            }
            let id = workflow.workflow_id.clone();
            if tables.workflows.insert(id.clone(), workflow).is_some() {
                return Err(DbError::Duplicate { kind: "workflow", id });
            }
        }

        for record in snapshot.records {
            if !tables.entities.contains_key(&record.entity_id) {
                return Err(unknown_entity(
                    "record",
                    &record.record_id.to_string(),
                    &record.entity_id,
                ));
            }
            let id = record.record_id;
            if tables.records.insert(id, record).is_some() {
                return Err(DbError::Duplicate {
                    kind: "record",
                    id: id.to_string(),
                });
            }
        }

        tables.audit = snapshot.audit;
        tables.roles = snapshot
            .roles
            .into_iter()
            .map(|(actor, roles)| (actor, roles.into_iter().collect()))
            .collect();

        tracing::debug!(
            entities = tables.entities.len(),
            rules = tables.rules.len(),
            measures = tables.measures.len(),
            workflows = tables.workflows.len(),
            records = tables.records.len(),
            "Database loaded",
        );

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Export the current contents.
    pub fn snapshot(&self) -> Result<Snapshot, DbError> {
        let tables = read(&self.tables)?;
        Ok(Snapshot {
            entities: tables.entities.values().cloned().collect(),
            rules: tables.rules.clone(),
            measures: tables.measures.values().cloned().collect(),
            workflows: tables.workflows.values().cloned().collect(),
            records: tables.records.values().cloned().collect(),
            audit: tables.audit.clone(),
            roles: tables
                .roles
                .iter()
                .map(|(actor, roles)| (actor.clone(), roles.iter().cloned().collect()))
                .collect(),
        })
    }

    pub fn metadata(&self) -> MetadataRepo {
        MetadataRepo::new(Arc::clone(&self.tables))
    }

    pub fn records(&self) -> RecordRepo {
        RecordRepo::new(Arc::clone(&self.tables))
    }

    pub fn audit(&self) -> AuditRepo {
        AuditRepo::new(Arc::clone(&self.tables))
    }

    pub fn roles(&self) -> RoleRepo {
        RoleRepo::new(Arc::clone(&self.tables))
    }
}

fn unknown_entity(kind: &str, id: &str, entity_id: &str) -> DbError {
    DbError::Definition(CoreError::InvalidArgument(format!(
        "{kind} {id} references unknown entity '{entity_id}'"
    )))
}

pub(crate) fn read(tables: &Shared) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
    tables
        .read()
        .map_err(|_| StoreError::Backend("table lock poisoned".into()))
}

pub(crate) fn write(tables: &Shared) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
    tables
        .write()
        .map_err(|_| StoreError::Backend("table lock poisoned".into()))
}
