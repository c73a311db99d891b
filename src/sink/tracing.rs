use tracing::error;

use super::core::{error_chain, FailureContext, FailureSink};

/// Default sink: one structured `ERROR` event per caught failure.
///
/// The logger name is recorded as the `logger` field so several engines can be told apart
/// in one log stream.
#[derive(Debug, Clone)]
pub struct TracingSink {
    logger: String,
}

impl TracingSink {
    #[must_use]
    pub fn new(logger: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
        }
    }

    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(crate::runtime_config::DEFAULT_LOGGER)
    }
}

impl FailureSink for TracingSink {
    fn log_failure(&self, err: &(dyn std::error::Error + 'static), context: &FailureContext<'_>) {
        let chain = error_chain(err);
        error!(
            logger = %self.logger,
            invocation_id = %context.invocation_id,
            operation = %context.operation,
            kind = %context.kind,
            matched = %context.matched,
            bind_name = ?context.bind_name,
            error = %err,
            error_chain = ?chain,
            "Failure caught"
        );
    }
}
