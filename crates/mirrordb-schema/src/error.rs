use std::collections::BTreeMap;
use std::fmt;

///
/// err!
/// Format and push one error message onto an [`ErrorTree`].
///

#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}

///
/// ErrorTree
///
/// Validation errors aggregated per schema location. Leaf messages belong to
/// the node the tree was built for; children are keyed by the identifier of
/// the nested node (model name, field ident) they describe.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    errors: Vec<String>,
    children: BTreeMap<String, ErrorTree>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one leaf error onto this node.
    pub fn add(&mut self, err: impl fmt::Display) {
        self.errors.push(err.to_string());
    }

    /// Borrow (creating if needed) the child tree for a nested node.
    pub fn child(&mut self, key: impl Into<String>) -> &mut Self {
        self.children.entry(key.into()).or_default()
    }

    /// Merge a subtree under the given key, dropping it if empty.
    pub fn merge(&mut self, key: impl Into<String>, other: Self) {
        if !other.is_empty() {
            let entry = self.children.entry(key.into()).or_default();
            entry.errors.extend(other.errors);
            for (k, v) in other.children {
                entry.merge(k, v);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Total number of leaf errors, including nested ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    /// Consume the tree: `Ok(())` when empty, otherwise the tree itself.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Iterate leaf errors as `path: message` lines.
    fn lines(&self, path: &str, out: &mut Vec<String>) {
        for err in &self.errors {
            if path.is_empty() {
                out.push(err.clone());
            } else {
                out.push(format!("{path}: {err}"));
            }
        }
        for (key, child) in &self.children {
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            child.lines(&child_path, out);
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Vec::new();
        self.lines("", &mut out);
        write!(f, "{}", out.join("; "))
    }
}

impl std::error::Error for ErrorTree {}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::ErrorTree;

    #[test]
    fn empty_tree_is_ok() {
        let errs = ErrorTree::new();
        assert!(errs.is_empty());
        assert!(errs.result().is_ok());
    }

    #[test]
    fn nested_errors_render_with_path() {
        let mut errs = ErrorTree::new();
        err!(errs.child("contact").child("address"), "unknown target");
        err!(errs, "top level");

        assert_eq!(errs.len(), 2);
        let rendered = errs.to_string();
        assert!(rendered.contains("contact.address: unknown target"));
        assert!(rendered.contains("top level"));
    }

    #[test]
    fn merge_skips_empty_subtrees() {
        let mut errs = ErrorTree::new();
        errs.merge("contact", ErrorTree::new());
        assert!(errs.is_empty());

        let mut sub = ErrorTree::new();
        sub.add("bad ident");
        errs.merge("contact", sub);
        assert_eq!(errs.len(), 1);
    }
}
