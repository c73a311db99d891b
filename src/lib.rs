//! # faultline
//!
//! **faultline** runs a unit of work and routes its failure to the most specific registered
//! handler: `try / except / else / finally` as a runtime-configured object instead of syntax.
//!
//! ## Overview
//!
//! An [`Engine`] owns a table of failure handlers keyed by [`ErrorKind`]. Operations wrapped by
//! the engine return an [`Outcome`]; when one fails, the engine classifies the failure through
//! its [`Fault`] implementation, finds the nearest registered kind in the [`KindHierarchy`],
//! and either lets the failure propagate (no handler, or debug mode) or reports it to a
//! [`sink::FailureSink`] and runs the handler. A success callback runs when the operation
//! completes without a value, and a cleanup callback runs at the end of every call.
//!
//! ## Architecture
//!
//! - **[`kind`]** - Error kinds, the kind hierarchy and the [`Fault`] classification trait
//! - **[`matcher`]** - Registration rules ([`Catch`]) and failure handlers
//! - **[`table`]** - The handler table and best-match resolution
//! - **[`context`]** - Per-invocation bindings, explicit and task-local
//! - **[`adapter`]** - Immediate and suspending callables behind one signature
//! - **[`engine`]** - The configuration surface and the per-call state machine
//! - **[`sink`]** - Failure reporting; [`sink::TracingSink`] by default
//! - **[`runtime_config`]** - Environment-based engine configuration
//! - **[`logging`]** - Optional `tracing-subscriber` setup
//! - **[`metrics`]** - Per-engine dispatch counters
//!
//! ### Dispatch Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Engine
//!     participant Wrapped
//!     participant Table as HandlerTable
//!     participant Handler
//!
//!     App->>Engine: on_failure(Catch::kind(K), handler)
//!     Engine->>Table: copy, register, publish
//!     App->>Engine: wrap("op", operation)
//!     Engine-->>App: Wrapped
//!
//!     App->>Wrapped: call(args).await
//!     Wrapped->>Wrapped: run operation in a fresh context
//!     Wrapped->>Table: resolve(&failure)
//!     Table-->>Wrapped: nearest matcher
//!     Wrapped->>Handler: call(invocation, failure)
//!     Handler-->>Wrapped: Outcome
//!     Wrapped->>Wrapped: cleanup, drop bindings
//!     Wrapped-->>App: Outcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use faultline::{Callable, Catch, Engine, ErrorKind, Fault, FailureHandler, KindHierarchy};
//! use faultline::sink::TracingSink;
//!
//! const ARITHMETIC: ErrorKind = ErrorKind::new("ArithmeticError");
//! const ZERO_DIVISION: ErrorKind = ErrorKind::new("ZeroDivisionError");
//!
//! #[derive(Debug, Fault)]
//! #[fault(kind = ZERO_DIVISION)]
//! struct DivideByZero;
//!
//! impl std::fmt::Display for DivideByZero {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("division by zero")
//!     }
//! }
//! impl std::error::Error for DivideByZero {}
//!
//! let hierarchy = KindHierarchy::builder()
//!     .kind(ARITHMETIC, ErrorKind::ROOT)?
//!     .kind(ZERO_DIVISION, ARITHMETIC)?
//!     .build();
//!
//! let engine: Engine<(i64, i64), i64, DivideByZero> =
//!     Engine::new(hierarchy, Arc::new(TracingSink::default()), false);
//! engine.on_failure(
//!     Catch::kind(ARITHMETIC).bind_as("e"),
//!     FailureHandler::immediate(|_| Ok(Some(0))),
//! )?;
//!
//! let divide = engine.wrap(
//!     "divide",
//!     Callable::immediate(|(a, b): (i64, i64)| {
//!         if b == 0 { Err(DivideByZero) } else { Ok(Some(a / b)) }
//!     }),
//! );
//!
//! assert_eq!(divide.call_blocking((10, 2)).unwrap(), Some(5));
//! assert_eq!(divide.call_blocking((1, 0)).unwrap(), Some(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// The derive macro emits `::faultline::...` paths; this makes them resolve in-crate too.
extern crate self as faultline;

pub mod adapter;
pub mod context;
pub mod engine;
pub mod ids;
pub mod kind;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod runtime_config;
pub mod sink;
pub mod table;

/// Result of an operation or callback: a value, no value, or a failure
pub type Outcome<T, E> = Result<Option<T>, E>;

pub use adapter::Callable;
pub use context::{ContextError, Invocation, InvocationContext};
pub use engine::{Engine, Wrapped};
pub use ids::InvocationId;
pub use kind::{ErrorKind, Fault, HierarchyError, KindHierarchy};
pub use matcher::{Catch, ErrorMatcher, FailureHandler};
pub use runtime_config::EngineConfig;
pub use table::{HandlerTable, RegistrationError};
