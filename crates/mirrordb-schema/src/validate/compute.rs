use crate::{
    MAX_IDENTIFYING_FIELDS,
    build::Schema,
    err,
    error::ErrorTree,
    node::{Dependency, Field, Model},
};

/// Compute and related-alias rules for one model.
pub fn validate_model(schema: &Schema, model: &Model, errs: &mut ErrorTree) {
    for field in &model.fields {
        let field_errs = errs.child(field.ident.clone());

        if let Some(compute) = &field.compute {
            if field.related.is_some() {
                err!(field_errs, "a field is computed or related, never both");
            }
            if field.default.is_some() {
                err!(field_errs, "computed fields cannot declare a default");
            }
            if field.required {
                err!(field_errs, "computed fields cannot be required");
            }

            for dep in &compute.depends {
                validate_dependency(schema, model, dep, field_errs);
            }
        }

        if let Some(related) = &field.related {
            validate_related(schema, model, field, field_errs, &related.relation, &related.field);
        }
    }
}

// A dependency names a field of this model, or one attribute/computed field
// one hop through a relational field of this model.
fn validate_dependency(schema: &Schema, model: &Model, dep: &Dependency, errs: &mut ErrorTree) {
    match dep {
        Dependency::Local(name) => {
            if model.get(name).is_none() {
                err!(errs, "dependency '{name}' does not exist on the model");
            }
        }
        Dependency::Related { relation, field } => {
            let Some(rel_field) = model.get(relation) else {
                err!(errs, "dependency relation '{relation}' does not exist on the model");
                return;
            };
            let Some(spec) = rel_field.relation_spec() else {
                err!(errs, "dependency relation '{relation}' is not a relational field");
                return;
            };
            let Some(target) = schema.get(&spec.target) else {
                // Reported by the relation pass; nothing to resolve against.
                return;
            };
            match target.get(field) {
                None => err!(
                    errs,
                    "dependency '{relation}.{field}' does not exist on target '{}'",
                    spec.target
                ),
                Some(remote) if remote.is_relation() => err!(
                    errs,
                    "dependency '{relation}.{field}' must name an attribute, not a relation"
                ),
                Some(_) => {}
            }
        }
    }
}

// Related aliases read one attribute through a singular relation.
fn validate_related(
    schema: &Schema,
    model: &Model,
    field: &Field,
    errs: &mut ErrorTree,
    relation: &str,
    remote_field: &str,
) {
    let Some(declared) = field.attribute_type() else {
        // Relational related-aliases are rejected by the relation pass.
        return;
    };

    let Some(rel_field) = model.get(relation) else {
        err!(errs, "related relation '{relation}' does not exist on the model");
        return;
    };
    let Some(spec) = rel_field.relation_spec() else {
        err!(errs, "related relation '{relation}' is not a relational field");
        return;
    };
    if spec.arity.is_plural() {
        err!(errs, "related aliases require a singular relation, '{relation}' is plural");
        return;
    }
    let Some(target) = schema.get(&spec.target) else {
        return;
    };
    let Some(remote) = target.get(remote_field) else {
        err!(
            errs,
            "related field '{relation}.{remote_field}' does not exist on target '{}'",
            spec.target
        );
        return;
    };
    match remote.attribute_type() {
        None => err!(
            errs,
            "related field '{relation}.{remote_field}' must be an attribute"
        ),
        Some(remote_ty) if remote_ty != declared => err!(
            errs,
            "related field '{relation}.{remote_field}' is {remote_ty}, alias declares {declared}"
        ),
        Some(_) => {}
    }
}

/// Identifying-list rules: non-empty, bounded, and every entry is a plain
/// required attribute so identity derivation is total and stable.
pub fn validate_identifying(model: &Model, errs: &mut ErrorTree) {
    if model.identifying.is_empty() {
        err!(errs, "model declares no identifying fields");
        return;
    }
    if model.identifying.len() > MAX_IDENTIFYING_FIELDS {
        err!(
            errs,
            "model declares {} identifying fields (limit {MAX_IDENTIFYING_FIELDS})",
            model.identifying.len()
        );
    }

    for ident in &model.identifying {
        let Some(field) = model.get(ident) else {
            err!(errs, "identifying field '{ident}' does not exist");
            continue;
        };
        if field.is_relation() {
            err!(errs, "identifying field '{ident}' must be an attribute");
        }
        if field.compute.is_some() || field.related.is_some() {
            err!(errs, "identifying field '{ident}' cannot be computed or related");
        }
        if !field.required {
            err!(errs, "identifying field '{ident}' must be required");
        }
    }
}

///
/// TESTS
///
