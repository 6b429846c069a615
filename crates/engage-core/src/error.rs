//! Error types module
//!
//! Errors raised by the host side of the plugin runtime. The plugin lifecycle
//! hooks themselves have no failure channel, so every variant here describes
//! something the host detected while parsing input, resolving plugins or
//! driving the lifecycle.

/// Log level the host uses when reporting an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected misses like unregistered plugin classes
    Debug,
    /// Warning level - for input the host had to reject
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum EngageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid interactions result: {0}")]
    InvalidInteractions(String),

    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),

    #[error("Cannot {action} plugin {plugin} in state {state}")]
    LifecycleViolation {
        plugin: String,
        state: String,
        action: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for EngageError {
    fn from(err: anyhow::Error) -> Self {
        EngageError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for EngageError {
    fn from(err: serde_json::Error) -> Self {
        EngageError::InvalidInteractions(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn engage_error_static_metadata(err: &EngageError) -> (&'static str, bool, LogLevel) {
    match err {
        EngageError::InvalidInput(_) => ("INVALID_INPUT", false, LogLevel::Debug),
        EngageError::InvalidInteractions(_) => ("INVALID_INTERACTIONS", true, LogLevel::Warn),
        EngageError::PluginNotFound(_) => ("PLUGIN_NOT_FOUND", false, LogLevel::Debug),
        EngageError::LifecycleViolation { .. } => ("LIFECYCLE_VIOLATION", false, LogLevel::Warn),
        EngageError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
        EngageError::InternalWithSource { .. } => ("INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl EngageError {
    /// Machine-readable error code (e.g., "PLUGIN_NOT_FOUND")
    pub fn error_code(&self) -> &'static str {
        engage_error_static_metadata(self).0
    }

    /// Whether retrying the operation with fresh input can succeed
    pub fn is_recoverable(&self) -> bool {
        engage_error_static_metadata(self).1
    }

    pub fn log_level(&self) -> LogLevel {
        engage_error_static_metadata(self).2
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}
