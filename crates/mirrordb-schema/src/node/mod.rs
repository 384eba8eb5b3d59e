pub mod field;
pub mod model;
pub mod patch;

pub use field::{ComputeSpec, Dependency, Field, FieldKind, RelatedSpec, RelationSpec};
pub use model::Model;
pub use patch::ModelPatch;
