//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A parsed setting is outside its allowed range.
    #[error("invalid {section} configuration: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}
