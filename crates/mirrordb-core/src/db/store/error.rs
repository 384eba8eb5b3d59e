use crate::value::ValueTag;
use mirrordb_schema::types::AttributeType;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Caller-facing store errors. `UnknownField` and `TypeMismatch` indicate a
/// caller bug and fail fast; `StaleRecord` is raised on any access through a
/// handle whose record has been deleted, so holders of stale references
/// learn about it instead of corrupting state.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("unknown model '{model}'")]
    UnknownModel { model: String },

    #[error("unknown field '{model}.{field}'")]
    UnknownField { model: String, field: String },

    #[error("type mismatch on '{model}.{field}': expected {expected}, got {got}")]
    TypeMismatch {
        model: String,
        field: String,
        expected: AttributeType,
        got: ValueTag,
    },

    #[error("stale record handle for model '{model}'")]
    StaleRecord { model: String },

    #[error("'{model}.{field}' is not a relational field")]
    NotARelation { model: String, field: String },

    #[error("'{model}.{field}' is not an attribute field")]
    NotAnAttribute { model: String, field: String },

    #[error("'{model}.{field}' is {actual}, operation requires a {expected} relation")]
    ArityMismatch {
        model: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("identifying field '{model}.{field}' missing from data")]
    MissingIdentity { model: String, field: String },

    #[error("record of model '{expected}' required, got '{got}'")]
    ModelMismatch { expected: String, got: String },
}
