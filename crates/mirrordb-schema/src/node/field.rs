use crate::types::{Arg, AttributeType, ComputeMode, RelationArity};
use serde::Serialize;

///
/// Field
///
/// One declared attribute or relation on a model. Constructed through
/// [`Field::attribute`] / [`Field::relation`] plus the chained setters;
/// every flag defaults to off.
///

#[derive(Clone, Debug, Serialize)]
pub struct Field {
    pub ident: String,
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Arg>,

    pub required: bool,
    pub readonly: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<ComputeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedSpec>,
}

impl Field {
    /// Declare a scalar attribute field.
    #[must_use]
    pub fn attribute(ident: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            ident: ident.into(),
            kind: FieldKind::Attribute(ty),
            default: None,
            required: false,
            readonly: false,
            compute: None,
            related: None,
        }
    }

    /// Declare a relational field. The inverse field must be declared on the
    /// target model with the paired arity; symmetry is checked at build time.
    #[must_use]
    pub fn relation(
        ident: impl Into<String>,
        arity: RelationArity,
        target: impl Into<String>,
        inverse: impl Into<String>,
    ) -> Self {
        Self {
            ident: ident.into(),
            kind: FieldKind::Relation(RelationSpec {
                arity,
                target: target.into(),
                inverse: inverse.into(),
                causal: false,
            }),
            default: None,
            required: false,
            readonly: false,
            compute: None,
            related: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Unlinking the last reference through a causal field deletes the
    /// now-unreferenced target record.
    #[must_use]
    pub fn causal(mut self) -> Self {
        if let FieldKind::Relation(spec) = &mut self.kind {
            spec.causal = true;
        }
        self
    }

    #[must_use]
    pub fn default_value(mut self, arg: impl Into<Arg>) -> Self {
        self.default = Some(arg.into());
        self
    }

    /// Mark the field computed. Dependencies name fields of the same record
    /// (`"name"`) or of directly related records (`"address.city"`).
    #[must_use]
    pub fn compute(mut self, mode: ComputeMode, depends: impl IntoIterator<Item = Dependency>) -> Self {
        self.compute = Some(ComputeSpec {
            mode,
            depends: depends.into_iter().collect(),
        });
        self
    }

    /// Alias one attribute of a singular related record.
    #[must_use]
    pub fn related(mut self, relation: impl Into<String>, field: impl Into<String>) -> Self {
        self.related = Some(RelatedSpec {
            relation: relation.into(),
            field: field.into(),
        });
        self
    }

    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation(_))
    }

    #[must_use]
    pub const fn relation_spec(&self) -> Option<&RelationSpec> {
        match &self.kind {
            FieldKind::Relation(spec) => Some(spec),
            FieldKind::Attribute(_) => None,
        }
    }

    #[must_use]
    pub const fn attribute_type(&self) -> Option<AttributeType> {
        match self.kind {
            FieldKind::Attribute(ty) => Some(ty),
            FieldKind::Relation(_) => None,
        }
    }
}

///
/// FieldKind
///

#[derive(Clone, Debug, Serialize)]
pub enum FieldKind {
    Attribute(AttributeType),
    Relation(RelationSpec),
}

///
/// RelationSpec
///

#[derive(Clone, Debug, Serialize)]
pub struct RelationSpec {
    pub arity: RelationArity,
    /// Target model name.
    pub target: String,
    /// Field on the target model holding the other side of this relation.
    pub inverse: String,
    /// Unlinking the last reference deletes the target.
    pub causal: bool,
}

///
/// ComputeSpec
///

#[derive(Clone, Debug, Serialize)]
pub struct ComputeSpec {
    pub mode: ComputeMode,
    pub depends: Vec<Dependency>,
}

///
/// Dependency
///
/// A field read declared by a compute function: either a field of the same
/// record, or one hop through a relational field of the same record.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Dependency {
    Local(String),
    Related { relation: String, field: String },
}

impl Dependency {
    /// Parse `"field"` or `"relation.field"` dependency notation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.split_once('.') {
            Some((relation, field)) => Self::Related {
                relation: relation.to_string(),
                field: field.to_string(),
            },
            None => Self::Local(s.to_string()),
        }
    }
}

impl From<&str> for Dependency {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

///
/// RelatedSpec
///

#[derive(Clone, Debug, Serialize)]
pub struct RelatedSpec {
    /// Singular relational field on the same model.
    pub relation: String,
    /// Attribute on the relation's target model.
    pub field: String,
}

///
/// TESTS
///
