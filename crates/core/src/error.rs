use uuid::Uuid;

use crate::expression::ExpressionError;
use crate::store::StoreError;
use crate::validation::rules::ValidationError;

/// Failure of a single measure or workflow operation.
///
/// Validation outcomes are data ([`ValidationError`] lists), never variants
/// of this enum; only operations that cannot complete surface here.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Required parameter missing: {parameter} (measure {measure} version {version})")]
    MissingParameter {
        measure: String,
        version: i32,
        parameter: String,
    },

    #[error("Measure evaluation failed: {measure} version {version}: {source}")]
    MeasureEvaluation {
        measure: String,
        version: i32,
        #[source]
        source: ExpressionError,
    },

    #[error("Entity {entity_id} does not have a workflow assigned")]
    NoWorkflow { entity_id: String },

    #[error("Transition {transition_id} does not belong to workflow {workflow_id}")]
    InvalidTransition {
        transition_id: Uuid,
        workflow_id: String,
    },

    #[error(
        "Cannot execute transition {transition_id} from state '{from_state}'. \
         Current state is '{current_state}'"
    )]
    IllegalState {
        transition_id: Uuid,
        from_state: String,
        current_state: String,
    },

    #[error("Actor '{actor}' lacks the roles required by transition {transition_id}")]
    Forbidden { transition_id: Uuid, actor: String },

    #[error("Transition {transition_id} preconditions failed: {}", summarize(.errors))]
    PreconditionFailed {
        transition_id: Uuid,
        errors: Vec<ValidationError>,
    },

    #[error("Conflict: record {record_id} changed while executing transition {transition_id}")]
    Conflict { record_id: Uuid, transition_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification a caller maps onto its own error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    IllegalState,
    Forbidden,
    EvaluationFailure,
    Conflict,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidArgument(_)
            | CoreError::MissingParameter { .. }
            | CoreError::InvalidTransition { .. } => ErrorKind::InvalidArgument,
            CoreError::MeasureEvaluation { .. } => ErrorKind::EvaluationFailure,
            CoreError::NoWorkflow { .. }
            | CoreError::IllegalState { .. }
            | CoreError::PreconditionFailed { .. } => ErrorKind::IllegalState,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::Conflict { .. } => ErrorKind::Conflict,
            CoreError::Store(StoreError::VersionConflict { .. }) => ErrorKind::Conflict,
            CoreError::Store(StoreError::RecordNotFound { .. }) => ErrorKind::NotFound,
            CoreError::Store(StoreError::Backend(_)) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| match &e.property_name {
            Some(property) => format!("{property}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::ErrorLevel;

    #[test]
    fn version_conflict_classifies_as_conflict() {
        let err = CoreError::from(StoreError::VersionConflict {
            record_id: Uuid::nil(),
            expected: 1,
            actual: 2,
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn precondition_message_lists_errors() {
        let err = CoreError::PreconditionFailed {
            transition_id: Uuid::nil(),
            errors: vec![
                ValidationError {
                    rule_id: Uuid::nil(),
                    property_name: Some("amount".into()),
                    message: "Amount is required".into(),
                    message_key: None,
                    level: ErrorLevel::Field,
                },
                ValidationError {
                    rule_id: Uuid::nil(),
                    property_name: None,
                    message: "Totals must balance".into(),
                    message_key: None,
                    level: ErrorLevel::Entity,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("amount: Amount is required; Totals must balance"));
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn missing_parameter_is_invalid_argument() {
        let err = CoreError::MissingParameter {
            measure: "tax".into(),
            version: 2,
            parameter: "rate".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("rate"));
    }
}
