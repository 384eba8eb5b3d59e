//! Core runtime for MirrorDB: typed values, the record arena, relation
//! maintenance, the command interpreter, the recompute scheduler, and the
//! `Db` handle exported via the `prelude`.

// public exports are one module level down
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod record;
pub mod types;
pub mod value;
pub mod view;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Maximum number of records one causal cascade may delete.
///
/// A cascade larger than this indicates a model graph error (for example a
/// causal relation ring) and aborts instead of consuming the whole store.
pub const MAX_CASCADE_RECORDS: usize = 10_000;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, stores, or internal helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Db, DbBuilder, command::RelationCommand, data::Data},
        error::Error,
        record::Record,
        types::{Float64, Timestamp},
        value::Value,
        view::RecordView,
    };
}
