use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, debug_span, Instrument};

use crate::adapter::Callable;
use crate::context::{ContextValue, Invocation};
use crate::kind::{Fault, KindHierarchy};
use crate::matcher::{Catch, FailureHandler};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::runtime_config::EngineConfig;
use crate::sink::{FailureContext, FailureSink, TracingSink};
use crate::table::{Callback, HandlerTable, RegistrationError};
use crate::Outcome;

/// How an invocation ended. Recorded in tracing events and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// The operation produced a value
    Returned,
    /// The operation produced no value; the success callback (if any) ran
    Succeeded,
    /// A failure was routed to its handler
    Handled,
    /// No registered kind covers the failure
    Unmatched,
    /// A matcher exists but debug mode lets the failure through
    DebugBypass,
    /// The failure handler itself failed
    HandlerFailed,
    /// Cleanup produced the final value
    CleanupOverride,
    /// Cleanup failed
    CleanupFailed,
}

impl Disposition {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Disposition::Returned => "returned",
            Disposition::Succeeded => "succeeded",
            Disposition::Handled => "handled",
            Disposition::Unmatched => "unmatched",
            Disposition::DebugBypass => "debug_bypass",
            Disposition::HandlerFailed => "handler_failed",
            Disposition::CleanupOverride => "cleanup_override",
            Disposition::CleanupFailed => "cleanup_failed",
        }
    }
}

/// State shared by an engine and every operation it wrapped
struct Shared<A, T, E> {
    table: ArcSwap<HandlerTable<A, T, E>>,
    /// Serializes copy-on-write registrations
    writer: Mutex<()>,
    sink: Arc<dyn FailureSink>,
    metrics: EngineMetrics,
}

/// Error-dispatch engine: the configuration surface.
///
/// Handlers are registered through `&self`; every registration swaps in a new handler
/// table, and each call of a [`Wrapped`] operation reads the table current at its start.
/// Cloning an engine yields another handle to the same configuration.
pub struct Engine<A, T, E> {
    shared: Arc<Shared<A, T, E>>,
}

impl<A, T, E> Engine<A, T, E>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Fault,
{
    /// Engine reporting caught failures to `sink`
    #[must_use]
    pub fn new(hierarchy: KindHierarchy, sink: Arc<dyn FailureSink>, debug: bool) -> Self {
        let table = HandlerTable::new(Arc::new(hierarchy), debug);
        Self {
            shared: Arc::new(Shared {
                table: ArcSwap::from_pointee(table),
                writer: Mutex::new(()),
                sink,
                metrics: EngineMetrics::new(),
            }),
        }
    }

    /// Engine with a [`TracingSink`] named after `config.logger_name`
    #[must_use]
    pub fn from_config(hierarchy: KindHierarchy, config: &EngineConfig) -> Self {
        let sink = Arc::new(TracingSink::new(config.logger_name.as_str()));
        Self::new(hierarchy, sink, config.debug)
    }

    /// Register `handler` for the kinds named by `catch`.
    ///
    /// # Errors
    ///
    /// See [`HandlerTable::register`]. A rejected registration leaves the table as it was.
    pub fn on_failure(
        &self,
        catch: Catch,
        handler: FailureHandler<A, T, E>,
    ) -> Result<(), RegistrationError> {
        let kinds: Vec<&str> = catch.kinds().iter().map(|k| k.name()).collect();
        self.try_update(|table| table.register(catch, handler))?;
        debug!(kinds = ?kinds, "Registered failure handler");
        Ok(())
    }

    /// Set the callback run when the operation completes without a value
    pub fn on_success(&self, callback: Callback<A, T, E>) {
        self.update(|table| table.set_success(callback));
    }

    /// Set the callback run at the end of every invocation
    pub fn on_cleanup(&self, callback: Callback<A, T, E>) {
        self.update(|table| table.set_cleanup(callback));
    }

    pub fn set_debug(&self, debug: bool) {
        self.update(|table| table.set_debug(debug));
    }

    /// Wrap `operation` so that every call goes through this engine
    #[must_use]
    pub fn wrap(
        &self,
        name: impl Into<String>,
        operation: Callable<A, Outcome<T, E>>,
    ) -> Wrapped<A, T, E> {
        let name: Arc<str> = Arc::from(name.into());
        debug!(operation = %name, suspending = operation.is_suspending(), "Wrapped operation");
        Wrapped {
            name,
            operation,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T, E> Engine<A, T, E> {
    #[must_use]
    pub fn debug(&self) -> bool {
        self.shared.table.load().debug()
    }

    /// The handler table as of now
    #[must_use]
    pub fn table(&self) -> Arc<HandlerTable<A, T, E>> {
        self.shared.table.load_full()
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Copy the current table, apply `f`, and publish the copy
    fn update(&self, f: impl FnOnce(&mut HandlerTable<A, T, E>)) {
        let _writer = self.shared.writer.lock();
        let mut next = HandlerTable::clone(&self.shared.table.load());
        f(&mut next);
        self.shared.table.store(Arc::new(next));
    }

    /// Like [`Engine::update`], but nothing is published when `f` fails
    fn try_update<X>(
        &self,
        f: impl FnOnce(&mut HandlerTable<A, T, E>) -> Result<(), X>,
    ) -> Result<(), X> {
        let _writer = self.shared.writer.lock();
        let mut next = HandlerTable::clone(&self.shared.table.load());
        f(&mut next)?;
        self.shared.table.store(Arc::new(next));
        Ok(())
    }
}

impl<A, T, E> Clone for Engine<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T, E> fmt::Debug for Engine<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("table", &*self.shared.table.load_full())
            .field("metrics", &self.shared.metrics.snapshot())
            .finish()
    }
}

/// An operation wrapped by an [`Engine`].
///
/// Cheap to clone and safe to call from many tasks and threads at once; every call runs
/// in its own [`crate::context::InvocationContext`].
pub struct Wrapped<A, T, E> {
    name: Arc<str>,
    operation: Callable<A, Outcome<T, E>>,
    shared: Arc<Shared<A, T, E>>,
}

impl<A, T, E> Wrapped<A, T, E>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Fault,
{
    /// Run the operation and dispatch its outcome.
    ///
    /// Works for immediate and suspending operations and handlers alike.
    pub async fn call(&self, args: A) -> Outcome<T, E> {
        let invocation = Invocation::new(Arc::clone(&self.name), Arc::new(args.clone()));
        let span = debug_span!(
            "invocation",
            invocation_id = %invocation.id(),
            operation = %self.name
        );
        let context = invocation.context().clone();
        context
            .scope(self.dispatch(invocation, args))
            .instrument(span)
            .await
    }

    /// Run a call to completion on the current thread without an async runtime.
    ///
    /// # Panics
    ///
    /// Panics if the operation or a registered callback suspends. Engines with
    /// suspending callables must be driven through [`Wrapped::call`].
    #[allow(clippy::panic)]
    pub fn call_blocking(&self, args: A) -> Outcome<T, E> {
        match self.call(args).now_or_never() {
            Some(outcome) => outcome,
            None => panic!(
                "operation '{}' suspended inside call_blocking; \
                use Wrapped::call from an async context",
                self.name
            ),
        }
    }

    async fn dispatch(&self, invocation: Invocation<A>, args: A) -> Outcome<T, E> {
        let table = self.shared.table.load_full();
        let metrics = &self.shared.metrics;
        metrics.record_invocation();

        let (mut outcome, mut disposition) = match self.operation.call(args).await {
            Ok(Some(value)) => {
                metrics.record_success();
                (Ok(Some(value)), Disposition::Returned)
            }
            Ok(None) => {
                let outcome = match table.success() {
                    Some(callback) => callback.call(invocation.clone()).await,
                    None => Ok(None),
                };
                // A failing success callback is not a success
                if outcome.is_ok() {
                    metrics.record_success();
                }
                (outcome, Disposition::Succeeded)
            }
            Err(error) => self.handle_failure(&table, &invocation, error).await,
        };

        if let Some(cleanup) = table.cleanup() {
            match cleanup.call(invocation.clone()).await {
                Ok(Some(value)) => {
                    metrics.record_cleanup_override();
                    outcome = Ok(Some(value));
                    disposition = Disposition::CleanupOverride;
                }
                Ok(None) => {}
                Err(error) => {
                    outcome = Err(error);
                    disposition = Disposition::CleanupFailed;
                }
            }
        }

        invocation.context().clear();

        if outcome.is_err() {
            metrics.record_propagated();
        }
        debug!(
            disposition = disposition.as_str(),
            failed = outcome.is_err(),
            "Invocation finished"
        );
        outcome
    }

    async fn handle_failure(
        &self,
        table: &HandlerTable<A, T, E>,
        invocation: &Invocation<A>,
        error: E,
    ) -> (Outcome<T, E>, Disposition) {
        let metrics = &self.shared.metrics;
        let Some(matcher) = table.resolve(&error) else {
            debug!(kind = %error.kind(), "No handler registered; failure propagates");
            return (Err(error), Disposition::Unmatched);
        };

        if matcher.effective_debug(table.debug()) {
            metrics.record_debug_bypass();
            debug!(
                kind = %error.kind(),
                matched = %matcher.kind,
                "Debug mode; failure propagates"
            );
            return (Err(error), Disposition::DebugBypass);
        }

        self.shared.sink.log_failure(
            &error,
            &FailureContext {
                invocation_id: invocation.id(),
                operation: invocation.operation(),
                kind: error.kind(),
                matched: matcher.kind,
                bind_name: matcher.bind_name.as_deref(),
            },
        );

        let error = Arc::new(error);
        if let Some(name) = &matcher.bind_name {
            let bound: ContextValue = Arc::clone(&error) as ContextValue;
            invocation.context().set_shared(name.to_string(), bound);
        }

        let handler = Arc::clone(&matcher.handler);
        match handler.call(invocation.clone(), error).await {
            Ok(value) => {
                metrics.record_handled();
                (Ok(value), Disposition::Handled)
            }
            Err(failure) => (Err(failure), Disposition::HandlerFailed),
        }
    }
}

impl<A, T, E> Wrapped<A, T, E> {
    /// Name the operation was wrapped under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A, T, E> Clone for Wrapped<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            operation: self.operation.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T, E> fmt::Debug for Wrapped<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .finish()
    }
}
