//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur while talking to a quantum service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Backend is not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// No backend satisfied the selection filter.
    #[error("No backend matches the filter ({0})")]
    NoEligibleBackend(String),

    /// The service rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials are missing or malformed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Job submission failed.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Invalid circuit or observable.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HalError {
    /// Whether the error is about identity rather than execution.
    pub fn is_auth(&self) -> bool {
        matches!(self, HalError::AuthenticationFailed(_) | HalError::Auth(_))
    }

    /// Whether the error means no usable backend could be reached.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            HalError::BackendUnavailable(_) | HalError::NoEligibleBackend(_)
        )
    }
}

impl From<xprobe_ir::IrError> for HalError {
    fn from(err: xprobe_ir::IrError) -> Self {
        HalError::InvalidCircuit(err.to_string())
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
