//! Error types for the session manager

use thiserror::Error;

/// Result type used throughout this crate
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors produced while sending an authenticated request
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request was rejected with 401 even after a refresh and retry
    #[error("Authentication failed after refreshing the access token")]
    Unauthorized,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    #[error("Token storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SessionError {
    /// Whether the error ended the session (credentials were cleared)
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::RefreshFailed(_))
    }
}

/// Outcome of a failed refresh.
///
/// Every caller waiting on the same in-flight refresh receives a copy of this
/// value, so it only carries owned, cloneable data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token is stored")]
    MissingRefreshToken,

    #[error("refresh endpoint answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("could not persist refreshed token: {0}")]
    Storage(String),
}

/// Errors raised by a [`TokenStore`](crate::TokenStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
