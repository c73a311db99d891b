use crate::ids::InvocationId;
use crate::kind::ErrorKind;

/// Call details reported alongside a caught failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext<'a> {
    /// Invocation the failure happened in
    pub invocation_id: InvocationId,
    /// Name the operation was wrapped under
    pub operation: &'a str,
    /// Primary kind of the failure
    pub kind: ErrorKind,
    /// Registered kind whose handler is about to run
    pub matched: ErrorKind,
    /// Context name the failure is bound under, if any
    pub bind_name: Option<&'a str>,
}

/// External collaborator receiving caught failures
pub trait FailureSink: Send + Sync {
    fn log_failure(&self, error: &(dyn std::error::Error + 'static), context: &FailureContext<'_>);
}

/// Render `error` and its `source()` chain, outermost first
#[must_use]
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }
    chain
}
