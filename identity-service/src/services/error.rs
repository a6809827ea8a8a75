use service_core::error::AppError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::models::{CertificateError, TenantScopeError};
use crate::utils::{Interrupted, PaginationError};
use crate::utils::time_ordered::TimeOrderedIdError;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] CodecError),

    #[error("Invalid format: bearer credential is neither a secret token nor a compact token")]
    MalformedBearer,

    #[error("Credential not found")]
    NotFound,

    #[error("Compact tokens cannot be used to authenticate")]
    CompactTokenRejected,

    #[error("{}", ambiguous_message(.populated))]
    AmbiguousActorReference { populated: Vec<&'static str> },

    #[error("OS entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Time-ordered id: {0}")]
    TimeOrderedId(#[from] TimeOrderedIdError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

fn ambiguous_message(populated: &[&'static str]) -> String {
    if populated.is_empty() {
        "Exactly one actor reference is required, none were provided".to_string()
    } else {
        format!(
            "Exactly one actor reference is required, got: {}",
            populated.join(", ")
        )
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidFormat(e) => AppError::BadRequest(anyhow::Error::new(e)),
            CredentialError::MalformedBearer => {
                AppError::BadRequest(anyhow::anyhow!("Malformed bearer credential"))
            }
            CredentialError::NotFound => AppError::NotFound(anyhow::anyhow!("Credential not found")),
            CredentialError::CompactTokenRejected => {
                AppError::Unauthorized(anyhow::anyhow!("Compact tokens cannot authenticate"))
            }
            e @ CredentialError::AmbiguousActorReference { .. } => {
                AppError::BadRequest(anyhow::anyhow!(e.to_string()))
            }
            CredentialError::EntropyUnavailable(e) => {
                AppError::InternalError(anyhow::anyhow!("Entropy unavailable: {}", e))
            }
            CredentialError::TimeOrderedId(e) => AppError::InternalError(anyhow::Error::new(e)),
            CredentialError::Store(e) => AppError::InternalError(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum FederationError {
    /// The provider or connection lacks a required capability. Reported to
    /// the tenant admin.
    #[error("Federation configuration error: {0}")]
    Config(String),

    /// Network failure or non-200 response. The caller may retry the attempt.
    #[error("Federation transport error: {0}")]
    Transport(String),

    #[error("Federation request timed out")]
    Timeout,

    #[error("Federation request cancelled")]
    Cancelled,

    /// Signature, issuer, audience, nonce or expiry check failed. Fatal.
    #[error("ID token verification failed: {0}")]
    Verification(String),

    #[error("Unknown or expired federation state")]
    InvalidState,

    #[error("Identity provider returned an error: {0}")]
    ProviderRejected(String),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] CodecError),

    #[error("Client secret could not be decrypted: {0}")]
    SecretDecryption(String),

    #[error("OS entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl FederationError {
    /// Only transport-class failures are worth a fresh attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FederationError::Transport(_) | FederationError::Timeout)
    }
}

impl From<Interrupted> for FederationError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => FederationError::Cancelled,
            Interrupted::DeadlineExceeded => FederationError::Timeout,
        }
    }
}

impl From<reqwest::Error> for FederationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FederationError::Timeout
        } else {
            FederationError::Transport(err.to_string())
        }
    }
}

impl From<FederationError> for AppError {
    fn from(err: FederationError) -> Self {
        match err {
            FederationError::Config(e) => AppError::FailedPrecondition(anyhow::anyhow!(e)),
            FederationError::Transport(e) => AppError::BadGateway(e),
            FederationError::Timeout => {
                AppError::GatewayTimeout("Identity provider timed out".to_string())
            }
            FederationError::Cancelled => AppError::Cancelled,
            FederationError::Verification(_) => {
                AppError::Unauthorized(anyhow::anyhow!("Federated login failed"))
            }
            FederationError::InvalidState => {
                AppError::BadRequest(anyhow::anyhow!("Unknown or expired federation state"))
            }
            FederationError::ProviderRejected(e) => {
                AppError::Unauthorized(anyhow::anyhow!("Identity provider rejected login: {}", e))
            }
            FederationError::ConnectionNotFound => {
                AppError::NotFound(anyhow::anyhow!("Connection not found"))
            }
            FederationError::InvalidFormat(e) => AppError::BadRequest(anyhow::Error::new(e)),
            FederationError::SecretDecryption(e) => {
                AppError::InternalError(anyhow::anyhow!("Client secret decryption failed: {}", e))
            }
            FederationError::EntropyUnavailable(e) => {
                AppError::InternalError(anyhow::anyhow!("Entropy unavailable: {}", e))
            }
            FederationError::Store(e) => AppError::InternalError(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum SamlError {
    #[error("Invalid certificate: {0}")]
    Certificate(#[from] CertificateError),

    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] CodecError),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<SamlError> for AppError {
    fn from(err: SamlError) -> Self {
        match err {
            SamlError::Certificate(e) => AppError::BadRequest(anyhow::Error::new(e)),
            SamlError::InvalidFormat(e) => AppError::BadRequest(anyhow::Error::new(e)),
            SamlError::ConnectionNotFound => {
                AppError::NotFound(anyhow::anyhow!("Connection not found"))
            }
            SamlError::Store(e) => AppError::InternalError(e),
        }
    }
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::BadPageToken => AppError::BadRequest(anyhow::anyhow!("Bad page token")),
            PaginationError::Encode(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}

impl From<TenantScopeError> for AppError {
    fn from(err: TenantScopeError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_verification_details_not_echoed() {
        let app: AppError =
            FederationError::Verification("kid abc not in JWKS".to_string()).into();
        assert_eq!(app.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!app.public_message().contains("abc"));
    }

    #[test]
    fn test_not_found_mapping() {
        let app: AppError = CredentialError::NotFound.into();
        assert_eq!(app.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ambiguous_message_lists_alternatives() {
        let err = CredentialError::AmbiguousActorReference {
            populated: vec!["user_id", "api_key_id"],
        };
        assert!(err.to_string().contains("user_id, api_key_id"));

        let none = CredentialError::AmbiguousActorReference { populated: vec![] };
        assert!(none.to_string().contains("none"));
    }

    #[test]
    fn test_retryable_classes() {
        assert!(FederationError::Transport("503".into()).is_retryable());
        assert!(FederationError::Timeout.is_retryable());
        assert!(!FederationError::Verification("sig".into()).is_retryable());
        assert!(!FederationError::Config("no S256".into()).is_retryable());
    }

    #[test]
    fn test_bad_page_token_is_bad_request() {
        let app: AppError = PaginationError::BadPageToken.into();
        assert_eq!(app.status_code(), StatusCode::BAD_REQUEST);
    }
}
