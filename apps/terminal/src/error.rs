//! # Terminal Error Type
//!
//! What the cashier sees when a command fails.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError ─────────┐                                                   │
//! │   (cart rules)      │                                                   │
//! │                     ├──► ApiError { code, message } ──► "✗ [CODE] msg" │
//! │  ClientError ───────┘                                                   │
//! │   (network, auth, backend)                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Serialized the same way, so a scripted caller can branch on `code`:
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Only 3 of Dolo 650 in stock, requested 4" }
//! ```

use serde::Serialize;
use std::fmt;

use pharmadesk_client::ClientError;
use pharmadesk_core::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Already shown to the user as a notification.
    #[serde(skip)]
    pub notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    CartError,
    NetworkError,
    AuthRequired,
    Forbidden,
    ConfigError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            notified: false,
        }
    }

    /// Marks an error the client layer has already toasted.
    pub fn notified(mut self) -> Self {
        self.notified = true;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// A malformed command line.
    pub fn usage(usage: &str) -> Self {
        ApiError::validation(format!("Usage: {}", usage))
    }

    pub fn auth_required() -> Self {
        ApiError::new(ErrorCode::AuthRequired, "Please log in first")
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ItemNotFound(_) => ErrorCode::NotFound,
            CoreError::OutOfStock { .. } | CoreError::CapacityExceeded { .. } => {
                ErrorCode::InsufficientStock
            }
            CoreError::QuantityOutOfRange { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
            CoreError::LineNotInCart(_)
            | CoreError::CartTooLarge { .. }
            | CoreError::EmptyCart
            | CoreError::CheckoutInProgress => ErrorCode::CartError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(core) => core.into(),
            ClientError::Network(_) => {
                ApiError::new(ErrorCode::NetworkError, "Cannot reach the server")
            }
            ClientError::Unauthorized | ClientError::NotAuthenticated => {
                ApiError::new(ErrorCode::AuthRequired, err.to_string())
            }
            ClientError::Forbidden(_) => ApiError::new(ErrorCode::Forbidden, err.to_string()),
            ClientError::NotFound(message) => ApiError::new(ErrorCode::NotFound, message),
            ClientError::Api { status, message } if status < 500 => {
                ApiError::validation(message)
            }
            ClientError::Api { message, .. } => ApiError::new(ErrorCode::Internal, message),
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_) => {
                ApiError::new(ErrorCode::ConfigError, err.to_string())
            }
            ClientError::Serialization(e) => {
                tracing::error!("Unreadable backend response: {}", e);
                ApiError::new(ErrorCode::Internal, "Unexpected response from server")
            }
            ClientError::SessionStorage(e) => {
                tracing::error!("Session storage failed: {}", e);
                ApiError::new(ErrorCode::Internal, "Could not save the session")
            }
            ClientError::NothingPending => ApiError::validation(err.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
