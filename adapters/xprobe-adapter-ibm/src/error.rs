//! Error types for the IBM Quantum adapter.

use thiserror::Error;
use xprobe_hal::HalError;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when using IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// Missing API key or token.
    #[error(
        "IBM Quantum credentials not found. Set IBM_API_KEY (with IBM_SERVICE_CRN) or IBM_QUANTUM_TOKEN."
    )]
    MissingToken,

    /// Token cannot be sent as a header.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// The API refused the credentials.
    #[error("IBM Quantum rejected the credentials ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// Missing service CRN.
    #[error("IBM_SERVICE_CRN is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// Service CRN cannot be sent as a header.
    #[error("Invalid IBM_SERVICE_CRN value")]
    InvalidServiceCrn,

    /// The credentials name a channel IBM Quantum does not serve.
    #[error("channel '{0}' is not served by IBM Quantum")]
    UnsupportedChannel(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("IBM Quantum API error: {message}")]
    ApiError {
        /// Error code from API.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Circuit could not be serialized.
    #[error("Circuit conversion error: {0}")]
    CircuitError(String),

    /// Observable could not be serialized.
    #[error("Observable conversion error: {0}")]
    ObservableError(String),

    /// Backend not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::MissingToken
            | IbmError::InvalidToken
            | IbmError::Unauthorized { .. }
            | IbmError::IamTokenExchange(_)
            | IbmError::MissingServiceCrn
            | IbmError::InvalidServiceCrn => HalError::AuthenticationFailed(e.to_string()),
            IbmError::UnsupportedChannel(_) => HalError::Auth(e.to_string()),
            IbmError::HttpError(err) => HalError::Network(err),
            IbmError::JsonError(err) => HalError::Serialization(err),
            IbmError::JobNotFound(id) => HalError::JobNotFound(id),
            IbmError::BackendUnavailable(msg) => HalError::BackendUnavailable(msg),
            IbmError::CircuitError(msg) | IbmError::ObservableError(msg) => {
                HalError::InvalidCircuit(msg)
            }
            IbmError::ApiError { .. } => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        let msg = IbmError::MissingToken.to_string();
        assert!(msg.contains("IBM_API_KEY"));
        assert!(msg.contains("IBM_QUANTUM_TOKEN"));
    }

    #[test]
    fn test_unauthorized_display() {
        let err = IbmError::Unauthorized {
            status: 401,
            message: "Invalid API key".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid API key"));
    }

    #[test]
    fn test_missing_service_crn_display() {
        assert!(IbmError::MissingServiceCrn.to_string().contains("IBM_SERVICE_CRN"));
    }

    #[test]
    fn test_credential_errors_to_hal_auth_failed() {
        for err in [
            IbmError::MissingToken,
            IbmError::InvalidToken,
            IbmError::MissingServiceCrn,
            IbmError::InvalidServiceCrn,
            IbmError::IamTokenExchange("400 Bad Request".into()),
            IbmError::Unauthorized {
                status: 403,
                message: "forbidden".into(),
            },
        ] {
            let hal: HalError = err.into();
            assert!(matches!(hal, HalError::AuthenticationFailed(_)), "{hal:?}");
        }
    }

    #[test]
    fn test_unsupported_channel_is_auth() {
        let hal: HalError = IbmError::UnsupportedChannel("local".into()).into();
        assert!(hal.is_auth());
        assert!(hal.to_string().contains("channel 'local'"));
    }

    #[test]
    fn test_job_not_found_to_hal() {
        let hal: HalError = IbmError::JobNotFound("j1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "j1"));
    }

    #[test]
    fn test_backend_unavailable_to_hal() {
        let hal: HalError = IbmError::BackendUnavailable("ibm_kyoto".into()).into();
        assert!(matches!(hal, HalError::BackendUnavailable(msg) if msg == "ibm_kyoto"));
    }

    #[test]
    fn test_conversion_errors_to_hal_invalid_circuit() {
        let hal: HalError = IbmError::ObservableError("non-hermitian".into()).into();
        assert!(matches!(hal, HalError::InvalidCircuit(_)));
    }

    #[test]
    fn test_api_error_to_hal_backend() {
        let hal: HalError = IbmError::ApiError {
            code: None,
            message: "server error".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Backend(msg) if msg.contains("server error")));
    }

    #[test]
    fn test_json_error_to_hal_serialization() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let hal: HalError = IbmError::from(err).into();
        assert!(matches!(hal, HalError::Serialization(_)));
    }
}
