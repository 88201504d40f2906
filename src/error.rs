//! Error types for pass issuance.

use http::StatusCode;

/// Errors raised while building, signing or publishing a pass.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Missing or invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The service-account key file or the certificate bundle could not be loaded.
    #[error("invalid credentials: {message}")]
    Credentials { message: String },

    /// The remote resource does not exist (HTTP 404).
    #[error("resource not found: {id}")]
    NotFound { id: String },

    /// Token exchange failed or the remote API refused the credentials.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The remote API answered with a non-success status.
    #[error("remote error (status {status}): {message}")]
    Remote { status: StatusCode, message: String },

    /// The request never produced a response.
    #[error("network error: {message}")]
    Network { message: String },

    /// The remote API answered with a body that could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// The remote API returned a different resource than the one requested.
    #[error("unexpected resource: expected {expected}, got {actual}")]
    UnexpectedResource { expected: String, actual: String },

    /// Manifest or JWT signing failed.
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// The pass archive could not be assembled.
    #[error("packaging failed: {message}")]
    Packaging { message: String },
}

impl WalletError {
    /// Whether the error is the expected "does not exist" outcome of a lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    pub(crate) fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub(crate) fn packaging(message: impl Into<String>) -> Self {
        Self::Packaging {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for WalletError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for WalletError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Packaging {
            message: err.to_string(),
        }
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
