//! Error types for Ralph dashboard operations.
//!
//! Reading job artifacts never produces these errors: a missing or malformed
//! artifact is treated as "unknown" and the caller degrades. [`RalphError`]
//! covers the operations that can genuinely fail and whose failure the user
//! must see (deleting a job, saving a config, loading settings).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`RalphError`].
pub type Result<T> = std::result::Result<T, RalphError>;

/// Error type for fallible dashboard operations.
#[derive(Debug, Error)]
pub enum RalphError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// JSON parsing error
    #[error("JSON parse error in {context}: {message}")]
    JsonParse {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // =========================================================================
    // Job Errors
    // =========================================================================
    /// Job directory not found
    #[error("Job not found: {name}")]
    JobNotFound { name: String },

    /// Job name does not produce a usable directory name
    #[error("Invalid job name: {name:?}")]
    InvalidJobName { name: String },

    /// A job with this name already exists
    #[error("Job '{name}' already exists")]
    JobExists { name: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in Ralph)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RalphError {
    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parse error
    pub fn json_parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a job not found error
    pub fn job_not_found(name: impl Into<String>) -> Self {
        Self::JobNotFound { name: name.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Check the file syntax or delete it to use defaults"),
            Self::InvalidJobName { .. } => Some("Use letters, digits, or dashes in the project name"),
            Self::JobExists { .. } => Some("Pick a different name or edit the existing project"),
            Self::Io { .. } | Self::DirectoryCreation { .. } => {
                Some("Check permissions on the jobs directory")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_not_found_error() {
        let err = RalphError::job_not_found("my-job");
        assert!(err.to_string().contains("my-job"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_error_classification() {
        let err = RalphError::ConfigInvalid {
            path: "/tmp/dashboard.yaml".into(),
            message: "bad indent".into(),
        };
        assert!(err.is_config_error());
        assert!(err.guidance().is_some());
    }

    #[test]
    fn test_io_error_message() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RalphError::io("deleting job", "/jobs/alpha", source);
        assert_eq!(err.to_string(), "I/O error deleting job: /jobs/alpha");
        assert_eq!(err.guidance(), Some("Check permissions on the jobs directory"));
    }

    #[test]
    fn test_json_parse_error_keeps_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RalphError::json_parse("config.json", source);
        assert!(err.to_string().starts_with("JSON parse error in config.json"));
    }
}
