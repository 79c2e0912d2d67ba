use std::fmt;

use thiserror::Error;

use crate::domain::{PartialFailure, Step};

/// External system a failure was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    TagStore,
    RecordStore,
    Pipeline,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::TagStore => "tag store",
            Backend::RecordStore => "release-record store",
            Backend::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

/// Unified error type for voyager operations
#[derive(Error, Debug)]
pub enum VoyagerError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found in {backend}: {resource}")]
    NotFound { backend: Backend, resource: String },

    #[error("Conflict in {backend}: {resource} already exists")]
    Conflict { backend: Backend, resource: String },

    #[error("Network error talking to {backend} during {operation}: {reason}")]
    Network {
        backend: Backend,
        operation: String,
        reason: String,
    },

    #[error("{0}")]
    PartialFailure(Box<PartialFailure>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in voyager
pub type Result<T> = std::result::Result<T, VoyagerError>;

impl VoyagerError {
    /// Create a validation error with context
    pub fn validation(msg: impl Into<String>) -> Self {
        VoyagerError::Validation(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VoyagerError::Config(msg.into())
    }

    pub fn not_found(backend: Backend, resource: impl Into<String>) -> Self {
        VoyagerError::NotFound {
            backend,
            resource: resource.into(),
        }
    }

    pub fn conflict(backend: Backend, resource: impl Into<String>) -> Self {
        VoyagerError::Conflict {
            backend,
            resource: resource.into(),
        }
    }

    pub fn network(
        backend: Backend,
        operation: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        VoyagerError::Network {
            backend,
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn partial(
        operation: &'static str,
        target: impl Into<String>,
        completed: Vec<Step>,
        failed: Step,
        cause: VoyagerError,
    ) -> Self {
        VoyagerError::PartialFailure(Box::new(PartialFailure::new(
            operation, target, completed, failed, cause,
        )))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VoyagerError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, VoyagerError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoyagerError::config("missing owner");
        assert_eq!(err.to_string(), "Configuration error: missing owner");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VoyagerError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_backend_errors_name_backend_and_resource() {
        let err = VoyagerError::not_found(Backend::TagStore, "v1.2.3");
        assert_eq!(err.to_string(), "Not found in tag store: v1.2.3");
        assert!(err.is_not_found());

        let err = VoyagerError::conflict(Backend::RecordStore, "v1.2.3");
        assert!(err.is_conflict());
        assert!(err.to_string().contains("release-record store"));
    }

    #[test]
    fn test_network_error_names_operation() {
        let err = VoyagerError::network(Backend::Pipeline, "trigger v1.0.0", "timed out");
        let msg = err.to_string();
        assert!(msg.contains("pipeline"));
        assert!(msg.contains("trigger v1.0.0"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_partial_failure_reports_cause_backend() {
        let err = VoyagerError::partial(
            "release",
            "v1.0.0",
            vec![Step::CreateTag],
            Step::CreateRecord,
            VoyagerError::network(Backend::RecordStore, "create record v1.0.0", "reset"),
        );
        let VoyagerError::PartialFailure(report) = &err else {
            panic!("expected a partial failure");
        };
        assert!(matches!(
            report.cause,
            VoyagerError::Network {
                backend: Backend::RecordStore,
                ..
            }
        ));
        assert!(err.to_string().contains("v1.0.0"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (VoyagerError::config("x"), "Configuration error"),
            (VoyagerError::validation("x"), "Invalid input"),
            (VoyagerError::not_found(Backend::TagStore, "x"), "Not found"),
            (VoyagerError::conflict(Backend::TagStore, "x"), "Conflict"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
