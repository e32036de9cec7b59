//! Read access to entity, rule, measure and workflow definitions.

use cbap_core::metadata::{EntityDefinition, Measure, WorkflowDefinition, WorkflowTransition};
use cbap_core::store::{MetadataStore, StoreError};
use cbap_core::validation::{RuleScope, ValidationRule};
use uuid::Uuid;

use crate::{read, Shared};

pub struct MetadataRepo {
    tables: Shared,
}

impl MetadataRepo {
    pub(crate) fn new(tables: Shared) -> Self {
        Self { tables }
    }

    /// Every measure identifier with its latest version, sorted by identifier.
    pub fn list_measures(&self) -> Result<Vec<(String, i32)>, StoreError> {
        let tables = read(&self.tables)?;
        let mut latest: Vec<(String, i32)> = Vec::new();
        for (identifier, version) in tables.measures.keys() {
            match latest.last_mut() {
                Some((last, v)) if last == identifier => *v = *version,
                _ => latest.push((identifier.clone(), *version)),
            }
        }
        Ok(latest)
    }
}

impl MetadataStore for MetadataRepo {
    fn entity(&self, entity_id: &str) -> Result<Option<EntityDefinition>, StoreError> {
        Ok(read(&self.tables)?.entities.get(entity_id).cloned())
    }

    fn field_rules(
        &self,
        entity_id: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationRule>, StoreError> {
        Ok(read(&self.tables)?
            .rules
            .iter()
            .filter(|r| {
                r.scope == RuleScope::Field
                    && r.entity_id == entity_id
                    && r.property_name.as_deref() == Some(property_name)
            })
            .cloned()
            .collect())
    }

    fn scope_rules(
        &self,
        entity_id: &str,
        scope: RuleScope,
    ) -> Result<Vec<ValidationRule>, StoreError> {
        Ok(read(&self.tables)?
            .rules
            .iter()
            .filter(|r| r.scope == scope && r.entity_id == entity_id)
            .cloned()
            .collect())
    }

    fn measure(&self, identifier: &str, version: i32) -> Result<Option<Measure>, StoreError> {
        Ok(read(&self.tables)?
            .measures
            .get(&(identifier.to_string(), version))
            .cloned())
    }

    fn latest_measure(&self, identifier: &str) -> Result<Option<Measure>, StoreError> {
        Ok(read(&self.tables)?
            .measures
            .range((identifier.to_string(), i32::MIN)..=(identifier.to_string(), i32::MAX))
            .next_back()
            .map(|(_, m)| m.clone()))
    }

    fn measure_versions(&self, identifier: &str) -> Result<Vec<i32>, StoreError> {
        Ok(read(&self.tables)?
            .measures
            .range((identifier.to_string(), i32::MIN)..=(identifier.to_string(), i32::MAX))
            .map(|((_, version), _)| *version)
            .collect())
    }

    fn workflow(&self, workflow_id: &str) -> Result<Option<WorkflowDefinition>, StoreError> {
        Ok(read(&self.tables)?.workflows.get(workflow_id).cloned())
    }

    fn transition(&self, transition_id: Uuid) -> Result<Option<WorkflowTransition>, StoreError> {
        Ok(read(&self.tables)?.transitions.get(&transition_id).cloned())
    }
}
