//! # Error Kinds
//!
//! Failures are classified into nominal [`ErrorKind`]s arranged in a single-rooted tree,
//! the [`KindHierarchy`]. The hierarchy is built once at startup and never mutated; the
//! handler table only changes *which* kinds have handlers.
//!
//! ```rust
//! use faultline::kind::{ErrorKind, KindHierarchy};
//!
//! const ARITHMETIC: ErrorKind = ErrorKind::new("ArithmeticError");
//! const ZERO_DIVISION: ErrorKind = ErrorKind::new("ZeroDivisionError");
//!
//! let hierarchy = KindHierarchy::builder()
//!     .kind(ARITHMETIC, ErrorKind::ROOT)?
//!     .kind(ZERO_DIVISION, ARITHMETIC)?
//!     .build();
//!
//! assert!(hierarchy.is_subkind(ZERO_DIVISION, ARITHMETIC));
//! assert!(!hierarchy.is_subkind(ARITHMETIC, ZERO_DIVISION));
//! # Ok::<(), faultline::kind::HierarchyError>(())
//! ```
//!
//! A kind is declared under a parent that already exists, so cycles cannot be built.

use std::collections::HashMap;
use std::fmt;

pub use faultline_macros::Fault;

/// A node in the failure-category tree. Identity is the name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorKind(&'static str);

impl ErrorKind {
    /// The root kind. Every failure is classified under it.
    pub const ROOT: ErrorKind = ErrorKind("Error");

    /// Create a kind with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The kind's name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorKind({})", self.0)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Classification of an error into the kind hierarchy.
///
/// Every error produced by a wrapped operation implements this. Most errors sit under
/// exactly one kind; an error that belongs to several unrelated categories can list the
/// extra ones in [`Fault::also_classified_as`].
///
/// Usually derived:
///
/// ```rust
/// use faultline::kind::{ErrorKind, Fault};
///
/// const TIMEOUT: ErrorKind = ErrorKind::new("Timeout");
///
/// #[derive(Debug, Fault)]
/// #[fault(kind = TIMEOUT)]
/// struct Timeout;
///
/// impl std::fmt::Display for Timeout {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("timed out")
///     }
/// }
/// impl std::error::Error for Timeout {}
///
/// assert_eq!(Timeout.kind(), TIMEOUT);
/// ```
pub trait Fault: std::error::Error + Send + Sync + 'static {
    /// The primary kind of this error
    fn kind(&self) -> ErrorKind;

    /// Additional kinds this error is classified under
    fn also_classified_as(&self) -> &[ErrorKind] {
        &[]
    }
}

/// Error returned while building a [`KindHierarchy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// The kind was already declared
    DuplicateKind(ErrorKind),
    /// The parent has not been declared yet
    UnknownParent {
        /// Kind being declared
        kind: ErrorKind,
        /// Missing parent
        parent: ErrorKind,
    },
    /// The root is implicit and cannot be declared under a parent
    RootRedeclared,
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyError::DuplicateKind(kind) => {
                write!(f, "kind hierarchy error: '{kind}' is already declared")
            }
            HierarchyError::UnknownParent { kind, parent } => write!(
                f,
                "kind hierarchy error: cannot declare '{kind}' under '{parent}'. \
                Parents must be declared before their children."
            ),
            HierarchyError::RootRedeclared => write!(
                f,
                "kind hierarchy error: the root kind '{}' is implicit and cannot be redeclared",
                ErrorKind::ROOT
            ),
        }
    }
}

impl std::error::Error for HierarchyError {}

/// Immutable single-rooted tree of error kinds.
#[derive(Debug, Clone)]
pub struct KindHierarchy {
    /// kind -> parent; the root maps to `None`
    parents: HashMap<ErrorKind, Option<ErrorKind>>,
}

impl KindHierarchy {
    /// Start building a hierarchy. The root is always present.
    #[must_use]
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder {
            parents: HashMap::from([(ErrorKind::ROOT, None)]),
        }
    }

    /// A hierarchy with only the root kind
    #[must_use]
    pub fn flat() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.parents.contains_key(&kind)
    }

    /// Number of kinds including the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Parent of `kind`.
    ///
    /// Undeclared kinds are treated as direct children of the root.
    #[must_use]
    pub fn parent(&self, kind: ErrorKind) -> Option<ErrorKind> {
        match self.parents.get(&kind) {
            Some(parent) => *parent,
            None if kind.is_root() => None,
            None => Some(ErrorKind::ROOT),
        }
    }

    /// Walk from `kind` up to the root, `kind` first.
    #[must_use]
    pub fn ancestors(&self, kind: ErrorKind) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            next: Some(kind),
        }
    }

    /// `true` when `kind` equals `of` or descends from it
    #[must_use]
    pub fn is_subkind(&self, kind: ErrorKind, of: ErrorKind) -> bool {
        self.ancestors(kind).any(|k| k == of)
    }

    /// Distance from the root (the root has depth 0)
    #[must_use]
    pub fn depth(&self, kind: ErrorKind) -> usize {
        self.ancestors(kind).count() - 1
    }
}

impl Default for KindHierarchy {
    fn default() -> Self {
        Self::flat()
    }
}

/// Iterator returned by [`KindHierarchy::ancestors`]
pub struct Ancestors<'a> {
    hierarchy: &'a KindHierarchy,
    next: Option<ErrorKind>,
}

impl Iterator for Ancestors<'_> {
    type Item = ErrorKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.hierarchy.parent(current);
        Some(current)
    }
}

/// Builder for [`KindHierarchy`]
#[derive(Debug)]
pub struct HierarchyBuilder {
    parents: HashMap<ErrorKind, Option<ErrorKind>>,
}

impl HierarchyBuilder {
    /// Declare `kind` as a child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `kind` is the root, is already declared, or `parent` is unknown.
    pub fn kind(mut self, kind: ErrorKind, parent: ErrorKind) -> Result<Self, HierarchyError> {
        if kind.is_root() {
            return Err(HierarchyError::RootRedeclared);
        }
        if self.parents.contains_key(&kind) {
            return Err(HierarchyError::DuplicateKind(kind));
        }
        if !self.parents.contains_key(&parent) {
            return Err(HierarchyError::UnknownParent { kind, parent });
        }
        self.parents.insert(kind, Some(parent));
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> KindHierarchy {
        KindHierarchy {
            parents: self.parents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP: ErrorKind = ErrorKind::new("LookupError");
    const KEY: ErrorKind = ErrorKind::new("KeyError");
    const INDEX: ErrorKind = ErrorKind::new("IndexError");
    const STRAY: ErrorKind = ErrorKind::new("Stray");

    fn sample() -> KindHierarchy {
        KindHierarchy::builder()
            .kind(LOOKUP, ErrorKind::ROOT)
            .and_then(|b| b.kind(KEY, LOOKUP))
            .and_then(|b| b.kind(INDEX, LOOKUP))
            .map(HierarchyBuilder::build)
            .unwrap()
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let h = sample();
        let chain: Vec<_> = h.ancestors(KEY).collect();
        assert_eq!(chain, vec![KEY, LOOKUP, ErrorKind::ROOT]);
        assert_eq!(h.depth(KEY), 2);
        assert_eq!(h.depth(ErrorKind::ROOT), 0);
    }

    #[test]
    fn test_siblings_are_not_subkinds() {
        let h = sample();
        assert!(h.is_subkind(KEY, LOOKUP));
        assert!(h.is_subkind(KEY, KEY));
        assert!(!h.is_subkind(KEY, INDEX));
        assert!(!h.is_subkind(LOOKUP, KEY));
    }

    #[test]
    fn test_undeclared_kind_sits_under_root() {
        let h = sample();
        assert!(!h.contains(STRAY));
        assert_eq!(h.parent(STRAY), Some(ErrorKind::ROOT));
        assert!(h.is_subkind(STRAY, ErrorKind::ROOT));
        assert!(!h.is_subkind(STRAY, LOOKUP));
    }

    #[test]
    fn test_builder_rejects_bad_declarations() {
        let err = KindHierarchy::builder().kind(KEY, LOOKUP).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::UnknownParent {
                kind: KEY,
                parent: LOOKUP
            }
        );

        let err = KindHierarchy::builder()
            .kind(LOOKUP, ErrorKind::ROOT)
            .and_then(|b| b.kind(LOOKUP, ErrorKind::ROOT))
            .unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateKind(LOOKUP));

        let err = KindHierarchy::builder()
            .kind(ErrorKind::ROOT, ErrorKind::ROOT)
            .unwrap_err();
        assert_eq!(err, HierarchyError::RootRedeclared);
    }

    #[test]
    fn test_flat_hierarchy() {
        let h = KindHierarchy::flat();
        assert_eq!(h.len(), 1);
        assert!(h.contains(ErrorKind::ROOT));
        assert_eq!(h.parent(ErrorKind::ROOT), None);
    }
}
