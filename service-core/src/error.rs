use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Caller-facing error classes shared by every crate in the workspace.
///
/// Domain errors convert into this type at the edge. The `Display` output is
/// meant for logs; [`AppError::public_message`] is what a remote caller sees.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

/// Serializable error body for whatever transport wraps this crate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // 499 is the de-facto "client closed request" code.
            AppError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
            }
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message that is safe to hand to an external caller.
    ///
    /// Client errors echo their own message. Unauthorized and server-side
    /// classes collapse to a fixed string so verification failures and
    /// internal state never leak.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Conflict(err)
            | AppError::Forbidden(err)
            | AppError::FailedPrecondition(err) => err.to_string(),
            AppError::Unauthorized(_) => "Unauthorized".to_string(),
            AppError::BadGateway(_) => "Upstream provider error".to_string(),
            AppError::GatewayTimeout(_) => "Upstream provider timed out".to_string(),
            AppError::Cancelled => "Request cancelled".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::ConfigError(_) => "Configuration error".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            AppError::BadGateway(msg) => Some(msg.clone()),
            _ => None,
        };
        ErrorResponse {
            error: self.public_message(),
            details,
        }
    }
}
