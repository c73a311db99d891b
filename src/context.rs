//! # Invocation Context
//!
//! Each call of a wrapped operation owns one [`InvocationContext`]: a small name → value
//! map used to hand ambient values (the bound failure among them) to handlers and cleanup.
//!
//! The context is reachable two ways:
//!
//! - explicitly, through the [`Invocation`] every handler receives;
//! - ambiently, through the free functions in this module ([`get`], [`set`], [`delete`],
//!   [`contains`], [`current`]), which resolve the context of the call running on the
//!   current task. The operation itself uses these since its signature is the caller's.
//!
//! The ambient scope is attached to the invocation's future, not to a thread or to the
//! engine, so two calls interleaved on one executor, or running on two threads, never see
//! each other's bindings. Outside a call every ambient accessor returns
//! [`ContextError::NoActiveInvocation`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ids::InvocationId;

/// A value stored in the context
pub type ContextValue = Arc<dyn Any + Send + Sync>;

tokio::task_local! {
    static CURRENT: InvocationContext;
}

/// Misuse of the invocation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// An ambient accessor was called outside of a running invocation
    NoActiveInvocation,
    /// No binding exists under the name
    Missing(String),
    /// A binding exists but holds a different type
    TypeMismatch(String),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::NoActiveInvocation => write!(
                f,
                "invocation context error: no active invocation. \
                Context accessors are only valid while a wrapped operation is running."
            ),
            ContextError::Missing(name) => {
                write!(f, "invocation context error: no binding named '{name}'")
            }
            ContextError::TypeMismatch(name) => write!(
                f,
                "invocation context error: binding '{name}' holds a different type"
            ),
        }
    }
}

impl std::error::Error for ContextError {}

/// Per-invocation binding map. Cloning shares the same bindings.
#[derive(Clone, Default)]
pub struct InvocationContext {
    bindings: Arc<Mutex<HashMap<String, ContextValue>>>,
}

impl InvocationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name`, returning the previous binding
    #[must_use]
    pub fn set<V>(&self, name: impl Into<String>, value: V) -> Option<ContextValue>
    where
        V: Any + Send + Sync,
    {
        self.set_shared(name, Arc::new(value))
    }

    /// Bind an already shared value under `name`
    pub fn set_shared(&self, name: impl Into<String>, value: ContextValue) -> Option<ContextValue> {
        self.bindings.lock().insert(name.into(), value)
    }

    /// Fetch the binding under `name` as a `V`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Missing`] if nothing is bound, [`ContextError::TypeMismatch`] if the
    /// binding is not a `V`.
    pub fn get<V>(&self, name: &str) -> Result<Arc<V>, ContextError>
    where
        V: Any + Send + Sync,
    {
        let value = self
            .get_raw(name)
            .ok_or_else(|| ContextError::Missing(name.to_string()))?;
        value
            .downcast::<V>()
            .map_err(|_| ContextError::TypeMismatch(name.to_string()))
    }

    /// Fetch the binding under `name` without a type check
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<ContextValue> {
        self.bindings.lock().get(name).cloned()
    }

    /// Remove the binding under `name`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Missing`] if nothing is bound.
    pub fn delete(&self, name: &str) -> Result<ContextValue, ContextError> {
        self.bindings
            .lock()
            .remove(name)
            .ok_or_else(|| ContextError::Missing(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.lock().contains_key(name)
    }

    /// Names currently bound, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.bindings.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.lock().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.bindings.lock().clear();
    }

    /// Run `fut` with this context as the ambient one
    pub(crate) fn scope<F>(self, fut: F) -> tokio::task::futures::TaskLocalFuture<Self, F>
    where
        F: std::future::Future,
    {
        CURRENT.scope(self, fut)
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("keys", &self.keys())
            .finish()
    }
}

/// One in-flight call, as seen by handlers and callbacks.
///
/// Carries the original call arguments and the call's own context.
pub struct Invocation<A> {
    id: InvocationId,
    operation: Arc<str>,
    args: Arc<A>,
    context: InvocationContext,
}

impl<A> Invocation<A> {
    pub(crate) fn new(operation: Arc<str>, args: Arc<A>) -> Self {
        Self {
            id: InvocationId::new(),
            operation,
            args,
            context: InvocationContext::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Name the operation was wrapped under
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The arguments the wrapped operation was called with
    #[must_use]
    pub fn args(&self) -> &A {
        &self.args
    }

    #[must_use]
    pub fn context(&self) -> &InvocationContext {
        &self.context
    }
}

impl<A> Clone for Invocation<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            operation: Arc::clone(&self.operation),
            args: Arc::clone(&self.args),
            context: self.context.clone(),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Invocation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("args", &self.args)
            .field("context", &self.context)
            .finish()
    }
}

/// The context of the invocation running on this task.
///
/// # Errors
///
/// [`ContextError::NoActiveInvocation`] outside a call.
pub fn current() -> Result<InvocationContext, ContextError> {
    CURRENT
        .try_with(InvocationContext::clone)
        .map_err(|_| ContextError::NoActiveInvocation)
}

/// Fetch a binding from the active invocation's context.
///
/// # Errors
///
/// See [`current`] and [`InvocationContext::get`].
pub fn get<V>(name: &str) -> Result<Arc<V>, ContextError>
where
    V: Any + Send + Sync,
{
    current()?.get(name)
}

/// Bind a value in the active invocation's context, returning the previous binding.
///
/// # Errors
///
/// [`ContextError::NoActiveInvocation`] outside a call.
pub fn set<V>(name: impl Into<String>, value: V) -> Result<Option<ContextValue>, ContextError>
where
    V: Any + Send + Sync,
{
    Ok(current()?.set(name, value))
}

/// Remove a binding from the active invocation's context.
///
/// # Errors
///
/// See [`current`] and [`InvocationContext::delete`].
pub fn delete(name: &str) -> Result<ContextValue, ContextError> {
    current()?.delete(name)
}

/// Whether the active invocation's context has a binding under `name`.
///
/// # Errors
///
/// [`ContextError::NoActiveInvocation`] outside a call.
pub fn contains(name: &str) -> Result<bool, ContextError> {
    Ok(current()?.contains(name))
}
