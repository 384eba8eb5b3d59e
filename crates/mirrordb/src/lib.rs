//! MirrorDB: a schema-first reactive record store mirroring a remote ORM
//! in process memory.
//!
//! ## Crate layout
//! - `schema`: declarative model/field/patch nodes, the schema builder,
//!   and definition-time validation.
//! - `core`: the runtime; typed values, the record arena, relation
//!   maintenance, the command interpreter, the recompute scheduler, and
//!   the `Db` handle.
//!
//! The `prelude` module mirrors the surface a synchronization layer or UI
//! binding consumes: the `Db`, payload builders, and domain vocabulary.

pub use mirrordb_core as core;
pub use mirrordb_schema as schema;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::error::Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        db::{Db, DbBuilder, command::RelationCommand, compute::ComputeCtx, data::Data},
        error::Error,
        model::Hooks,
        obs::{event::ChangeBatch, sink::EventSink},
        record::Record,
        types::{Float64, Timestamp},
        value::Value,
        view::RecordView,
    };
    pub use crate::schema::{
        build::{Schema, SchemaBuilder},
        node::{Field, Model, ModelPatch},
        types::{Arg, AttributeType, ComputeMode, RelationArity},
    };
}
