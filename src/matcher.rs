//! # Error Matchers
//!
//! A [`Catch`] describes a registration: which kinds, whether it overrides the engine's
//! debug mode, and under which name the failure is exposed in the invocation context.
//! Paired with a [`FailureHandler`] it becomes one [`ErrorMatcher`] per kind in the
//! handler table.
//!
//! Whether a handler wants the failure value is declared when it is built
//! ([`FailureHandler::immediate`] vs [`FailureHandler::immediate_with_error`]), never
//! discovered at call time.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::adapter::{BoxFuture, Callable};
use crate::context::Invocation;
use crate::kind::ErrorKind;
use crate::Outcome;

/// Inline capacity for kind lists; most registrations name one or two kinds
pub const MAX_INLINE_KINDS: usize = 4;

/// Kinds named by one registration
pub type KindVec = SmallVec<[ErrorKind; MAX_INLINE_KINDS]>;

/// Registration rule for [`crate::engine::Engine::on_failure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catch {
    kinds: KindVec,
    debug: Option<bool>,
    bind_as: Option<String>,
}

impl Catch {
    /// Catch the given kinds
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            debug: None,
            bind_as: None,
        }
    }

    /// Catch a single kind
    #[must_use]
    pub fn kind(kind: ErrorKind) -> Self {
        Self::new([kind])
    }

    /// Override the engine's debug mode for these kinds.
    ///
    /// `true` lets matched failures propagate even when the engine is not in debug mode;
    /// `false` handles them even when it is.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Expose the failure in the invocation context under `name` while it is handled
    #[must_use]
    pub fn bind_as(mut self, name: impl Into<String>) -> Self {
        self.bind_as = Some(name.into());
        self
    }

    #[must_use]
    pub fn kinds(&self) -> &[ErrorKind] {
        &self.kinds
    }

    #[must_use]
    pub fn debug_override(&self) -> Option<bool> {
        self.debug
    }

    #[must_use]
    pub fn bind_name(&self) -> Option<&str> {
        self.bind_as.as_deref()
    }
}

/// Handler invoked for a matched failure
pub enum FailureHandler<A, T, E> {
    /// Receives only the invocation
    Plain(Callable<Invocation<A>, Outcome<T, E>>),
    /// Receives the invocation and the failure
    WithError(Callable<(Invocation<A>, Arc<E>), Outcome<T, E>>),
}

impl<A, T, E> FailureHandler<A, T, E>
where
    A: Send + Sync + 'static,
    T: Send + 'static,
    E: Send + Sync + 'static,
{
    #[must_use]
    pub fn immediate<F>(f: F) -> Self
    where
        F: Fn(Invocation<A>) -> Outcome<T, E> + Send + Sync + 'static,
    {
        FailureHandler::Plain(Callable::immediate(f))
    }

    #[must_use]
    pub fn immediate_with_error<F>(f: F) -> Self
    where
        F: Fn(Invocation<A>, Arc<E>) -> Outcome<T, E> + Send + Sync + 'static,
    {
        FailureHandler::WithError(Callable::immediate(move |(inv, err)| f(inv, err)))
    }

    #[must_use]
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        FailureHandler::Plain(Callable::suspending(f))
    }

    #[must_use]
    pub fn suspending_with_error<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation<A>, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        FailureHandler::WithError(Callable::suspending(move |(inv, err)| f(inv, err)))
    }

    /// Run the handler for `error`
    pub fn call(
        &self,
        invocation: Invocation<A>,
        error: Arc<E>,
    ) -> BoxFuture<'static, Outcome<T, E>> {
        match self {
            FailureHandler::Plain(f) => f.call(invocation),
            FailureHandler::WithError(f) => f.call((invocation, error)),
        }
    }
}

impl<A, T, E> FailureHandler<A, T, E> {
    #[must_use]
    pub fn wants_error(&self) -> bool {
        matches!(self, FailureHandler::WithError(_))
    }

    #[must_use]
    pub fn is_suspending(&self) -> bool {
        match self {
            FailureHandler::Plain(f) => f.is_suspending(),
            FailureHandler::WithError(f) => f.is_suspending(),
        }
    }
}

impl<A, T, E> fmt::Debug for FailureHandler<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureHandler::Plain(c) => f.debug_tuple("Plain").field(c).finish(),
            FailureHandler::WithError(c) => f.debug_tuple("WithError").field(c).finish(),
        }
    }
}

/// One registered catch rule for one kind.
///
/// The handler is shared between all kinds of the registration that created it.
pub struct ErrorMatcher<A, T, E> {
    /// Kind this matcher is keyed under
    pub kind: ErrorKind,
    /// Handler shared with the other kinds of the same registration
    pub handler: Arc<FailureHandler<A, T, E>>,
    /// Per-matcher debug override
    pub debug_override: Option<bool>,
    /// Context name the failure is bound under
    pub bind_name: Option<Arc<str>>,
    /// Table-wide registration sequence number
    pub seq: u64,
}

impl<A, T, E> ErrorMatcher<A, T, E> {
    /// Debug mode for this matcher given the engine-wide flag
    #[must_use]
    pub fn effective_debug(&self, global: bool) -> bool {
        self.debug_override.unwrap_or(global)
    }
}

impl<A, T, E> Clone for ErrorMatcher<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            handler: Arc::clone(&self.handler),
            debug_override: self.debug_override,
            bind_name: self.bind_name.clone(),
            seq: self.seq,
        }
    }
}

impl<A, T, E> fmt::Debug for ErrorMatcher<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMatcher")
            .field("kind", &self.kind)
            .field("handler", &self.handler)
            .field("debug_override", &self.debug_override)
            .field("bind_name", &self.bind_name)
            .field("seq", &self.seq)
            .finish()
    }
}
