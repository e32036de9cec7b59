//! Metadata-driven evaluation core.
//!
//! Everything in this crate is pure domain logic: the expression interpreter,
//! validation rule engine, measure evaluator and workflow transition engine.
//! Persistence, authorization and audit storage are reached only through the
//! collaborator traits in [`store`].

pub mod audit;
pub mod calculated;
pub mod config;
pub mod error;
pub mod expression;
pub mod hashing;
pub mod measure;
pub mod metadata;
pub mod record;
pub mod store;
pub mod types;
pub mod validation;
pub mod value;
pub mod workflow;
