//! # Dispatch Engine
//!
//! [`Engine`] holds the configuration (handler table, failure sink, metrics) and
//! [`Wrapped`] runs one call of an operation through it.
//!
//! ## Call Sequence
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant W as Wrapped::call
//!     participant Op as Operation
//!     participant T as HandlerTable
//!     participant S as FailureSink
//!     participant H as Handler
//!     participant C as Cleanup
//!
//!     Caller->>W: call(args)
//!     W->>W: new Invocation + context scope
//!     W->>Op: call(args)
//!     alt Ok(Some(v))
//!         Op-->>W: value (success callback skipped)
//!     else Ok(None)
//!         W->>W: success callback, if any
//!     else Err(e)
//!         W->>T: resolve(&e)
//!         alt no matcher or debug
//!             T-->>W: e propagates
//!         else matcher
//!             W->>S: log_failure(e)
//!             W->>W: bind e under bind name
//!             W->>H: call(invocation, e)
//!         end
//!     end
//!     W->>C: cleanup, if any (always)
//!     W->>W: drop context bindings
//!     W-->>Caller: Outcome
//! ```
//!
//! ## Outcome Rules
//!
//! - A value from the operation skips the success callback.
//! - A failing handler or success callback yields its own failure; it is not dispatched again.
//! - Cleanup runs on every path. `Ok(Some(_))` from cleanup becomes the result even over a
//!   pending failure, `Ok(None)` keeps the earlier outcome, `Err(_)` replaces it.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use faultline::{Callable, Catch, Engine, ErrorKind, Fault, FailureHandler, KindHierarchy};
//! use faultline::sink::TracingSink;
//!
//! const PARSE: ErrorKind = ErrorKind::new("ParseError");
//!
//! #[derive(Debug, Fault)]
//! #[fault(kind = PARSE)]
//! struct ParseFailure(String);
//!
//! impl std::fmt::Display for ParseFailure {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "cannot parse '{}'", self.0)
//!     }
//! }
//! impl std::error::Error for ParseFailure {}
//!
//! let hierarchy = KindHierarchy::builder().kind(PARSE, ErrorKind::ROOT)?.build();
//! let engine: Engine<String, i64, ParseFailure> =
//!     Engine::new(hierarchy, Arc::new(TracingSink::default()), false);
//! engine.on_failure(Catch::kind(PARSE), FailureHandler::immediate(|_| Ok(Some(-1))))?;
//!
//! let parse = engine.wrap(
//!     "parse",
//!     Callable::immediate(|s: String| s.parse().map(Some).map_err(|_| ParseFailure(s))),
//! );
//! assert_eq!(parse.call_blocking("42".to_string()).unwrap(), Some(42));
//! assert_eq!(parse.call_blocking("x".to_string()).unwrap(), Some(-1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod core;

pub use core::{Engine, Wrapped};
