//! # Client Error Types
//!
//! Error types for everything that talks to the backend or the disk.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Session             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Unauthorized (401)     │ │
//! │  │  InvalidUrl     │  │  Api{status}    │  │  NotAuthenticated       │ │
//! │  │  ConfigLoad/Save│  │  NotFound       │  │  Forbidden (role)       │ │
//! │  └─────────────────┘  └─────────────────┘  │  SessionStorage         │ │
//! │                                            └─────────────────────────┘ │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │   Domain        │  │    Prompts      │                              │
//! │  │                 │  │                 │                              │
//! │  │  Core(CoreError)│  │  NothingPending │                              │
//! │  │  Serialization  │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pharmadesk_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering every failure a front-end must handle.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Backend unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response; `message` is the server's or the fallback.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The backend rejected the token; the session has been cleared.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    /// No session; the request was never sent.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The signed-in role may not perform this action.
    #[error("You do not have permission to {0}")]
    Forbidden(String),

    #[error("Session storage error: {0}")]
    SessionStorage(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Prompt Errors
    // =========================================================================
    #[error("No confirmation is pending")]
    NothingPending,
}

/// Coarse classification a front-end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    NotFound,
    Internal,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Api { status: 404, .. } | ClientError::NotFound(_) => ErrorKind::NotFound,
            // 2xx with `success: false` lands here too
            ClientError::Api { status, .. } if *status < 500 => ErrorKind::Validation,
            ClientError::Api { .. } => ErrorKind::Internal,
            ClientError::Unauthorized
            | ClientError::NotAuthenticated
            | ClientError::Forbidden(_) => ErrorKind::Auth,
            ClientError::Core(CoreError::ItemNotFound(_)) => ErrorKind::NotFound,
            ClientError::Core(_) => ErrorKind::Validation,
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_)
            | ClientError::Serialization(_)
            | ClientError::SessionStorage(_)
            | ClientError::NothingPending => ErrorKind::Internal,
        }
    }

    /// Returns true if the user must sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::NotAuthenticated)
    }

    /// Message suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Core(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Serialization(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}
