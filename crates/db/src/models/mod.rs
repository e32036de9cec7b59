pub mod snapshot;
pub mod tables;

pub use snapshot::Snapshot;
pub use tables::Tables;
