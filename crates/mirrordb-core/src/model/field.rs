use crate::{
    db::compute::ComputeCtx,
    model::{FieldId, ModelId},
    value::Value,
};
use mirrordb_schema::types::{AttributeType, ComputeMode, RelationArity};

///
/// ComputeFn
///
/// Function-pointer contract for computed fields. The context exposes
/// read-only access to the record and its relations; the scheduler
/// guarantees declared dependencies are resolved before the call.
///

pub type ComputeFn = fn(&ComputeCtx<'_>) -> Value;

///
/// FieldModel
/// Runtime field metadata, flattened from the schema at registry build.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Field name as used in data payloads and change events.
    pub ident: String,
    pub kind: FieldModelKind,
}

impl FieldModel {
    #[must_use]
    pub const fn attribute(&self) -> Option<&AttributeModel> {
        match &self.kind {
            FieldModelKind::Attribute(attr) => Some(attr),
            FieldModelKind::Relation(_) => None,
        }
    }

    #[must_use]
    pub const fn relation(&self) -> Option<&RelationModel> {
        match &self.kind {
            FieldModelKind::Relation(rel) => Some(rel),
            FieldModelKind::Attribute(_) => None,
        }
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(
            &self.kind,
            FieldModelKind::Attribute(AttributeModel { compute: Some(_), .. })
        )
    }

    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        match &self.kind {
            FieldModelKind::Attribute(attr) => attr.readonly || attr.compute.is_some(),
            FieldModelKind::Relation(rel) => rel.readonly,
        }
    }
}

///
/// FieldModelKind
///

#[derive(Debug)]
pub enum FieldModelKind {
    Attribute(AttributeModel),
    Relation(RelationModel),
}

///
/// AttributeModel
///

#[derive(Debug)]
pub struct AttributeModel {
    pub ty: AttributeType,
    pub default: Option<Value>,
    pub required: bool,
    pub readonly: bool,
    pub compute: Option<ComputeModel>,
}

///
/// RelationModel
///

#[derive(Debug)]
pub struct RelationModel {
    pub arity: RelationArity,
    pub target: ModelId,
    /// Field on the target model holding the other side of this relation.
    pub inverse: FieldId,
    /// Unlinking the last reference deletes the target.
    pub causal: bool,
    pub required: bool,
    pub readonly: bool,
}

///
/// ComputeModel
///

#[derive(Debug)]
pub struct ComputeModel {
    pub mode: ComputeMode,
    pub kind: ComputeKind,
    pub depends: Vec<DepModel>,
}

///
/// ComputeKind
///
/// Custom compute functions are registered by the caller; related aliases
/// are compiled to a built-in read-through of one field on the singular
/// relation target.
///

pub enum ComputeKind {
    Custom(ComputeFn),
    Related { relation: FieldId, field: FieldId },
}

impl std::fmt::Debug for ComputeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Related { relation, field } => f
                .debug_struct("Related")
                .field("relation", relation)
                .field("field", field)
                .finish(),
        }
    }
}

///
/// DepModel
/// Resolved compute dependency: a local field, or one hop through a
/// relational field.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DepModel {
    Local(FieldId),
    Related { relation: FieldId, field: FieldId },
}
