use crate::{
    build::Schema,
    err,
    error::ErrorTree,
    node::{Field, Model, RelationSpec},
};

/// Relation rules for one model: every relational field must resolve its
/// target and form a symmetric inverse pair with the paired arity.
pub fn validate_model(schema: &Schema, model: &Model, errs: &mut ErrorTree) {
    for field in &model.fields {
        let Some(spec) = field.relation_spec() else {
            continue;
        };
        let field_errs = errs.child(field.ident.clone());

        if field.default.is_some() {
            err!(field_errs, "relational fields cannot declare a default");
        }
        if field.compute.is_some() {
            err!(field_errs, "relational fields cannot be computed");
        }
        if field.related.is_some() {
            err!(field_errs, "relational fields cannot be related aliases");
        }
        if field.required && spec.arity.is_plural() {
            err!(field_errs, "required is not supported on plural relations");
        }

        validate_inverse(schema, model, field, spec, field_errs);
    }
}

// Check the inverse field on the target model points back at this field
// with the paired arity.
fn validate_inverse(
    schema: &Schema,
    model: &Model,
    field: &Field,
    spec: &RelationSpec,
    errs: &mut ErrorTree,
) {
    let Some(target) = schema.get(&spec.target) else {
        err!(errs, "unknown relation target '{}'", spec.target);
        return;
    };

    let Some(inverse) = target.get(&spec.inverse) else {
        err!(
            errs,
            "inverse '{}' does not exist on target '{}'",
            spec.inverse,
            spec.target
        );
        return;
    };

    let Some(inverse_spec) = inverse.relation_spec() else {
        err!(
            errs,
            "inverse '{}.{}' is not a relational field",
            spec.target,
            spec.inverse
        );
        return;
    };

    if inverse_spec.target != model.name {
        err!(
            errs,
            "inverse '{}.{}' targets '{}', expected '{}'",
            spec.target,
            spec.inverse,
            inverse_spec.target,
            model.name
        );
    }

    if inverse_spec.inverse != field.ident {
        err!(
            errs,
            "inverse '{}.{}' names '{}' as its inverse, expected '{}'",
            spec.target,
            spec.inverse,
            inverse_spec.inverse,
            field.ident
        );
    }

    if inverse_spec.arity != spec.arity.inverse() {
        err!(
            errs,
            "inverse '{}.{}' has arity {}, expected {} to pair with {}",
            spec.target,
            spec.inverse,
            inverse_spec.arity,
            spec.arity.inverse(),
            spec.arity
        );
    }
}

///
/// TESTS
///
