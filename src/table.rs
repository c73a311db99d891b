//! # Handler Table
//!
//! Maps error kinds to [`ErrorMatcher`]s and holds the success and cleanup singletons
//! plus the table-wide debug flag.
//!
//! ## Resolution
//!
//! For a failure, every kind it is classified under is walked up to the root. The first
//! registered kind met on each walk is the most specific candidate of that walk; kinds
//! further up are its ancestors and can never win. Across walks, a candidate that is an
//! ancestor of another candidate is dropped. What remains are the maximal candidates:
//!
//! - one maximal candidate: it is the handler;
//! - several (an error classified under unrelated kinds that both have handlers): the
//!   most recently registered wins and a warning names the competing kinds.
//!
//! With a single classification per error the walk always yields at most one candidate,
//! so the tie-break only applies to [`Fault::also_classified_as`] errors.

use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::adapter::Callable;
use crate::context::Invocation;
use crate::kind::{ErrorKind, Fault, KindHierarchy};
use crate::matcher::{Catch, ErrorMatcher, FailureHandler, MAX_INLINE_KINDS};
use crate::Outcome;

/// Callback type for the success and cleanup slots
pub type Callback<A, T, E> = Callable<Invocation<A>, Outcome<T, E>>;

/// Rejected registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A registration must name at least one kind
    NoKinds,
    /// The kind is not part of the engine's hierarchy
    UnknownKind(ErrorKind),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::NoKinds => write!(
                f,
                "registration error: a failure handler must be registered for at least one kind"
            ),
            RegistrationError::UnknownKind(kind) => write!(
                f,
                "registration error: kind '{kind}' is not declared in the kind hierarchy"
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Registered handlers of one engine.
///
/// Configured up front and then read concurrently; the engine swaps in a modified copy
/// on every registration.
pub struct HandlerTable<A, T, E> {
    hierarchy: Arc<KindHierarchy>,
    matchers: HashMap<ErrorKind, ErrorMatcher<A, T, E>>,
    success: Option<Callback<A, T, E>>,
    cleanup: Option<Callback<A, T, E>>,
    debug: bool,
    next_seq: u64,
}

impl<A, T, E> HandlerTable<A, T, E> {
    #[must_use]
    pub fn new(hierarchy: Arc<KindHierarchy>, debug: bool) -> Self {
        Self {
            hierarchy,
            matchers: HashMap::new(),
            success: None,
            cleanup: None,
            debug,
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn hierarchy(&self) -> &KindHierarchy {
        &self.hierarchy
    }

    /// Register `handler` for every kind of `catch`.
    ///
    /// A kind that already has a matcher is replaced; its debug override and bind name
    /// come from this registration only.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::NoKinds`] for an empty kind list and
    /// [`RegistrationError::UnknownKind`] for kinds missing from the hierarchy. Nothing is
    /// registered when an error is returned.
    pub fn register(
        &mut self,
        catch: Catch,
        handler: FailureHandler<A, T, E>,
    ) -> Result<(), RegistrationError> {
        if catch.kinds().is_empty() {
            return Err(RegistrationError::NoKinds);
        }
        if let Some(unknown) = catch
            .kinds()
            .iter()
            .find(|k| !self.hierarchy.contains(**k))
        {
            return Err(RegistrationError::UnknownKind(*unknown));
        }

        let handler = Arc::new(handler);
        let bind_name: Option<Arc<str>> = catch.bind_name().map(Arc::from);
        for kind in catch.kinds() {
            let seq = self.next_seq;
            self.next_seq += 1;
            let matcher = ErrorMatcher {
                kind: *kind,
                handler: Arc::clone(&handler),
                debug_override: catch.debug_override(),
                bind_name: bind_name.clone(),
                seq,
            };
            if self.matchers.insert(*kind, matcher).is_some() {
                debug!(kind = %kind, "Replaced existing failure handler");
            }
        }
        Ok(())
    }

    pub fn set_success(&mut self, callback: Callback<A, T, E>) {
        self.success = Some(callback);
    }

    pub fn set_cleanup(&mut self, callback: Callback<A, T, E>) {
        self.cleanup = Some(callback);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn success(&self) -> Option<&Callback<A, T, E>> {
        self.success.as_ref()
    }

    #[must_use]
    pub fn cleanup(&self) -> Option<&Callback<A, T, E>> {
        self.cleanup.as_ref()
    }

    #[must_use]
    pub fn matcher(&self, kind: ErrorKind) -> Option<&ErrorMatcher<A, T, E>> {
        self.matchers.get(&kind)
    }

    /// Kinds with a registered handler, sorted by name
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<ErrorKind> {
        let mut kinds: Vec<ErrorKind> = self.matchers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// `true` when any registered callable may suspend
    #[must_use]
    pub fn has_suspending_callables(&self) -> bool {
        self.success.as_ref().is_some_and(Callable::is_suspending)
            || self.cleanup.as_ref().is_some_and(Callable::is_suspending)
            || self.matchers.values().any(|m| m.handler.is_suspending())
    }
}

impl<A, T, E: Fault> HandlerTable<A, T, E> {
    /// Best matcher for `error`, or `None` when no registered kind subsumes it
    #[must_use]
    pub fn resolve(&self, error: &E) -> Option<&ErrorMatcher<A, T, E>> {
        let classes = iter::once(error.kind()).chain(error.also_classified_as().iter().copied());

        let mut candidates: SmallVec<[&ErrorMatcher<A, T, E>; MAX_INLINE_KINDS]> = SmallVec::new();
        for class in classes {
            let nearest = self
                .hierarchy
                .ancestors(class)
                .find_map(|k| self.matchers.get(&k));
            if let Some(m) = nearest {
                if !candidates.iter().any(|c| c.kind == m.kind) {
                    candidates.push(m);
                }
            }
        }

        let maximal: SmallVec<[&ErrorMatcher<A, T, E>; MAX_INLINE_KINDS]> = candidates
            .iter()
            .filter(|c| {
                !candidates
                    .iter()
                    .any(|o| o.kind != c.kind && self.hierarchy.is_subkind(o.kind, c.kind))
            })
            .copied()
            .collect();

        if maximal.len() > 1 {
            let competing: Vec<&str> = maximal.iter().map(|m| m.kind.name()).collect();
            warn!(
                error_kind = %error.kind(),
                competing = ?competing,
                "Ambiguous failure handlers - most recently registered wins"
            );
        }

        maximal.into_iter().max_by_key(|m| m.seq)
    }
}

impl<A, T, E> Clone for HandlerTable<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            hierarchy: Arc::clone(&self.hierarchy),
            matchers: self.matchers.clone(),
            success: self.success.clone(),
            cleanup: self.cleanup.clone(),
            debug: self.debug,
            next_seq: self.next_seq,
        }
    }
}

impl<A, T, E> fmt::Debug for HandlerTable<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kinds", &self.registered_kinds())
            .field("success", &self.success)
            .field("cleanup", &self.cleanup)
            .field("debug", &self.debug)
            .finish()
    }
}
