//! Error types for the globe engine.

use std::fmt;

/// Result type for globe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, composing or rendering a globe.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A configuration value is out of its valid range.
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// The density payload could not be interpreted at all.
    Payload {
        /// Description of what was invalid.
        detail: String,
    },
    /// Reading a file failed.
    Io {
        /// The path that failed.
        path: String,
        /// The error message.
        message: String,
    },
    /// The rendering backend has no drawable surface.
    BackendUnavailable {
        /// Why the backend could not be initialized.
        reason: String,
    },
    /// A rendering backend operation failed after initialization.
    Backend {
        /// The operation that failed.
        operation: &'static str,
        /// The error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig { field, detail } => {
                write!(f, "invalid config value for {field}: {detail}")
            }
            Error::Payload { detail } => write!(f, "invalid density payload: {detail}"),
            Error::Io { path, message } => write!(f, "failed to read {path}: {message}"),
            Error::BackendUnavailable { reason } => {
                write!(f, "rendering backend unavailable: {reason}")
            }
            Error::Backend { operation, message } => {
                write!(f, "rendering backend {operation} failed: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Error reported by a [`RenderBackend`](crate::RenderBackend) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// The operation that failed.
    pub operation: &'static str,
    /// The error message.
    pub message: String,
}

impl BackendError {
    /// Create a new backend error.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Error::Backend {
            operation: e.operation,
            message: e.message,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Payload {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_converts_to_backend_variant() {
        let err: Error = BackendError::new("render", "device lost").into();
        assert_eq!(
            err,
            Error::Backend {
                operation: "render",
                message: "device lost".to_string(),
            }
        );
        assert_eq!(err.to_string(), "rendering backend render failed: device lost");
    }
}
