use crate::{
    db::{compute::ComputeError, executor::ExecutorError, store::StoreError},
    model::RegistryError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for every public `Db` operation. Each variant wraps the
/// error enum of the layer that raised it; callers match on the inner enum
/// when they need to distinguish (the UI boundary typically only needs to
/// tell caller bugs from definition errors).
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    ComputeError(#[from] ComputeError),

    #[error(transparent)]
    ExecutorError(#[from] ExecutorError),

    #[error(transparent)]
    RegistryError(#[from] RegistryError),

    #[error(transparent)]
    StoreError(#[from] StoreError),
}

impl Error {
    /// True for the programmer-error classes (definition and recompute-graph
    /// errors) that calling code must not catch and retry.
    #[must_use]
    pub const fn is_programmer_error(&self) -> bool {
        matches!(self, Self::RegistryError(_) | Self::ComputeError(_))
    }
}
