use crate::{MAX_FIELD_NAME_LEN, MAX_MODEL_NAME_LEN, err, error::ErrorTree, node::Model};
use std::collections::BTreeSet;

// Model names are dotted snake_case ("mail.thread"); field idents are plain
// snake_case. Both are lowercase ascii and start with a letter.
fn is_valid_ident(s: &str, allow_dots: bool) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || (allow_dots && c == '.'))
}

/// Naming rules for one model and its fields.
pub fn validate_model(model: &Model, errs: &mut ErrorTree) {
    if !is_valid_ident(&model.name, true) {
        err!(errs, "model name '{}' is not a valid identifier", model.name);
    }
    if model.name.len() > MAX_MODEL_NAME_LEN {
        err!(
            errs,
            "model name '{}' exceeds {MAX_MODEL_NAME_LEN} characters",
            model.name
        );
    }

    let mut seen = BTreeSet::new();
    for field in &model.fields {
        let field_errs = errs.child(field.ident.clone());

        if !is_valid_ident(&field.ident, false) {
            err!(field_errs, "field ident is not a valid identifier");
        }
        if field.ident.len() > MAX_FIELD_NAME_LEN {
            err!(field_errs, "field ident exceeds {MAX_FIELD_NAME_LEN} characters");
        }
        if !seen.insert(field.ident.as_str()) {
            err!(field_errs, "duplicate field ident");
        }
    }
}

///
/// TESTS
///
