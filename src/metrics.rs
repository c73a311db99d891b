//! Per-engine dispatch counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every wrapped operation of one engine
#[derive(Debug)]
pub struct EngineMetrics {
    /// Calls started
    pub invocations: AtomicU64,
    /// Calls whose operation completed without failure
    pub succeeded: AtomicU64,
    /// Failures routed to a handler
    pub handled: AtomicU64,
    /// Calls that ended in a failure returned to the caller
    pub propagated: AtomicU64,
    /// Matched failures let through by debug mode
    pub debug_bypassed: AtomicU64,
    /// Calls whose result came from the cleanup callback
    pub cleanup_overrides: AtomicU64,
}

impl EngineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            invocations: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            handled: AtomicU64::new(0),
            propagated: AtomicU64::new(0),
            debug_bypassed: AtomicU64::new(0),
            cleanup_overrides: AtomicU64::new(0),
        }
    }

    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_propagated(&self) {
        self.propagated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debug_bypass(&self) {
        self.debug_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleanup_override(&self) {
        self.cleanup_overrides.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            propagated: self.propagated.load(Ordering::Relaxed),
            debug_bypassed: self.debug_bypassed.load(Ordering::Relaxed),
            cleanup_overrides: self.cleanup_overrides.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of [`EngineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub succeeded: u64,
    pub handled: u64,
    pub propagated: u64,
    pub debug_bypassed: u64,
    pub cleanup_overrides: u64,
}
