//! Declarative model schema for MirrorDB: model/field/patch nodes, the
//! schema builder, and definition-time validation.
//!
//! A schema is declared through [`build::SchemaBuilder`], which merges model
//! patches and validates the result exactly once. Everything downstream
//! (the runtime registry, the record store) consumes a validated
//! [`build::Schema`] and may assume its invariants hold.

pub mod build;
pub mod error;
pub mod node;
pub mod types;
pub mod validate;

/// Maximum length for model schema identifiers.
pub const MAX_MODEL_NAME_LEN: usize = 64;

/// Maximum length for field schema identifiers.
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Maximum number of fields allowed in a model's identifying list.
pub const MAX_IDENTIFYING_FIELDS: usize = 4;

use crate::build::BuildError;
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::*,
        types::{Arg, AttributeType, ComputeMode, RelationArity},
    };
    pub use serde::Serialize;
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    BuildError(#[from] BuildError),
}
