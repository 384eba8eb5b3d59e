pub mod compute;
pub mod naming;
pub mod relation;

use crate::{build::Schema, error::ErrorTree};

/// Validate a merged schema. All rule families run for every model so a
/// single build reports every violation at once instead of the first.
#[must_use]
pub fn validate_schema(schema: &Schema) -> ErrorTree {
    let mut errs = ErrorTree::new();

    for model in schema.models() {
        let mut model_errs = ErrorTree::new();

        naming::validate_model(model, &mut model_errs);
        relation::validate_model(schema, model, &mut model_errs);
        compute::validate_model(schema, model, &mut model_errs);
        compute::validate_identifying(model, &mut model_errs);

        errs.merge(model.name.clone(), model_errs);
    }

    errs
}
