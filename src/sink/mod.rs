//! # Failure Sinks
//!
//! The engine reports every failure it is about to handle to a [`FailureSink`] exactly
//! once, before the handler runs. Failures that propagate (unmatched or debug-bypassed)
//! are not reported; they reach the caller untouched.
//!
//! [`TracingSink`] is the default and emits one `ERROR` event per failure.

mod core;
mod tracing;

pub use self::core::{error_chain, FailureContext, FailureSink};
pub use self::tracing::TracingSink;
