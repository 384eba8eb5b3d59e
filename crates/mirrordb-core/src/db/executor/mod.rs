mod context;
pub(crate) mod delete;
pub(crate) mod load;
pub(crate) mod save;

pub use context::{ChangeLog, DirtyQueue, MutationCtx};
pub use save::SaveMode;

use crate::db::store::StoreError;
use thiserror::Error as ThisError;

///
/// ExecutorError
///

#[derive(Debug, ThisError)]
pub enum ExecutorError {
    #[error("record of model '{model}' already exists for this identity")]
    RecordExists { model: String },

    #[error("required field '{model}.{field}' has no value")]
    RequiredViolation { model: String, field: String },

    #[error("field '{model}.{field}' is readonly")]
    ReadonlyViolation { model: String, field: String },

    #[error("identifying field '{model}.{field}' cannot change after create")]
    IdentityViolation { model: String, field: String },

    #[error("causal cascade exceeded {limit} records")]
    CascadeOverflow { limit: usize },

    #[error(transparent)]
    StoreError(#[from] StoreError),
}
