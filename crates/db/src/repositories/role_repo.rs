//! Actor role membership.

use cbap_core::store::{Authorizer, StoreError};

use crate::{read, write, Shared};

pub struct RoleRepo {
    tables: Shared,
}

impl RoleRepo {
    pub(crate) fn new(tables: Shared) -> Self {
        Self { tables }
    }

    pub fn grant(&self, actor: &str, role: &str) -> Result<(), StoreError> {
        write(&self.tables)?
            .roles
            .entry(actor.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }
}

impl Authorizer for RoleRepo {
    fn has_any_role(&self, actor: &str, roles: &[String]) -> Result<bool, StoreError> {
        let tables = read(&self.tables)?;
        Ok(tables
            .roles
            .get(actor)
            .is_some_and(|held| roles.iter().any(|r| held.contains(r))))
    }
}
