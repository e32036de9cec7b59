/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Records, transitions, rules and audit entries are keyed by UUID.
pub type RecordId = uuid::Uuid;

/// Entity and workflow definitions are keyed by admin-chosen string ids.
pub type DefinitionId = String;

/// Evaluation context: variable name to dynamically-typed value.
///
/// Built per call and never persisted.
pub type Context = serde_json::Map<String, serde_json::Value>;
