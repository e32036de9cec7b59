//! Admin-authored definitions: entities, measures and workflows.
//!
//! Definitions are read-only at evaluation time. [`check_entity`] and
//! [`check_workflow`] are run by whoever loads them.

mod checks;
pub mod entity;
pub mod measure;
pub mod workflow;

pub use checks::{check_entity, check_measure, check_workflow};
pub use entity::{EntityDefinition, PropertyDefinition, PropertyType};
pub use measure::{Measure, MeasureParameter, ReturnType};
pub use workflow::{WorkflowDefinition, WorkflowState, WorkflowTransition};
