//! # Runtime Configuration Module
//!
//! Environment-variable based construction parameters for an [`crate::engine::Engine`].
//! There is no configuration file or CLI; embedders either build an [`EngineConfig`]
//! directly or load it from the environment at startup.
//!
//! ## Environment Variables
//!
//! ### `FAULTLINE_DEBUG`
//!
//! Enables debug mode for engines built with [`crate::engine::Engine::from_config`]:
//! matched failures propagate to the caller instead of being handled, so a debugger sees
//! the original failure. Accepts `true`/`false`/`1`/`0`/`yes`/`no`/`on`/`off`.
//!
//! Default: `false`
//!
//! ### `FAULTLINE_LOGGER`
//!
//! Logger name recorded by the default [`crate::sink::TracingSink`].
//!
//! Default: `faultline`
//!
//! ## Usage
//!
//! ```rust
//! use faultline::runtime_config::EngineConfig;
//!
//! let config = EngineConfig::from_env();
//! println!("debug: {}, logger: {}", config.debug, config.logger_name);
//! ```

use std::env;

/// Logger name used when none is configured
pub const DEFAULT_LOGGER: &str = "faultline";

/// Engine construction parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Let matched failures propagate instead of handling them
    pub debug: bool,
    /// Logger name for the default failure sink
    pub logger_name: String,
}

impl EngineConfig {
    #[must_use]
    pub fn new(debug: bool, logger_name: impl Into<String>) -> Self {
        Self {
            debug,
            logger_name: logger_name.into(),
        }
    }

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let debug = env::var("FAULTLINE_DEBUG")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);
        let logger_name = env::var("FAULTLINE_LOGGER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGGER.to_string());
        EngineConfig { debug, logger_name }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(false, DEFAULT_LOGGER)
    }
}

/// Parse the boolean spellings accepted in environment variables
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
