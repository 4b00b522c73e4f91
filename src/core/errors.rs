//! Shared error types for the engine

use thiserror::Error;

/// Main error type for riskmap operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid engine or threshold configuration, rejected at load
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Threshold set with non-monotonic level boundaries
    #[error("Non-monotonic thresholds in scope {scope}: {message}")]
    NonMonotonicThresholds { scope: String, message: String },

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// TOML configuration parse errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO errors (configuration file loading)
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
