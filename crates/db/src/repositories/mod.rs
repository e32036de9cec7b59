pub mod audit_repo;
pub mod metadata_repo;
pub mod record_repo;
pub mod role_repo;

pub use audit_repo::AuditRepo;
pub use metadata_repo::MetadataRepo;
pub use record_repo::RecordRepo;
pub use role_repo::RoleRepo;
