//! Error handling for the Rentdesk client

use std::fmt;
use thiserror::Error;

use rentdesk_session::SessionError;

/// Unified error type for the Rentdesk client
#[derive(Error, Debug)]
pub enum Error {
    /// Failures of the authenticated transport, including an ended session
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The API answered with a non-success status
    #[error("API error ({status}): {}", api_summary(.message, .body))]
    Api {
        status: u16,
        /// Message extracted from the response body, if it carried one
        message: Option<String>,
        body: String,
    },

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Build an API error from a status and raw response body
    pub fn api(status: u16, body: String) -> Self {
        let message = server_message(&body);
        Error::Api {
            status,
            message,
            body,
        }
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the session ended and the user must log in again
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Session(err) if err.is_session_expired())
    }

    /// Whether the request was finally refused for lack of valid
    /// credentials
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Session(SessionError::Unauthorized) => true,
            Error::Session(err) => err.is_session_expired(),
            Error::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// A message to show the user: the server's own message when the
    /// response carried one, `fallback` otherwise
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

fn api_summary<'a>(message: &'a Option<String>, body: &'a str) -> &'a str {
    message.as_deref().unwrap_or(body)
}

/// Pull a human-readable message out of an error body. The API reports
/// errors under `message`, `error` or `detail`.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.as_str().map(str::to_string)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentdesk_session::RefreshError;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = Error::api(400, r#"{"message": "Room number already exists"}"#.to_string());
        assert_eq!(err.user_message("Failed to save room"), "Room number already exists");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_user_message_reads_error_and_detail() {
        let err = Error::api(400, r#"{"error": "Invalid or expired reset token"}"#.to_string());
        assert_eq!(err.user_message("x"), "Invalid or expired reset token");

        let err = Error::api(404, r#"{"detail": "Not found."}"#.to_string());
        assert_eq!(err.user_message("x"), "Not found.");

        let err = Error::api(400, r#"{"error": ["Passwords are too similar"]}"#.to_string());
        assert_eq!(err.user_message("x"), "Passwords are too similar");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = Error::api(500, "<html>Server Error</html>".to_string());
        assert_eq!(err.user_message("Failed to fetch rooms"), "Failed to fetch rooms");

        let err = Error::api(400, r#"{"room_number": ["This field is required."]}"#.to_string());
        assert_eq!(err.user_message("Failed to save room"), "Failed to save room");

        let err = Error::general("boom");
        assert_eq!(err.user_message("Failed to delete room"), "Failed to delete room");
    }

    #[test]
    fn test_display_uses_message_or_body() {
        let err = Error::api(403, r#"{"detail": "Forbidden"}"#.to_string());
        assert_eq!(err.to_string(), "API error (403): Forbidden");

        let err = Error::api(502, "bad gateway".to_string());
        assert_eq!(err.to_string(), "API error (502): bad gateway");
    }

    #[test]
    fn test_session_expiry_detection() {
        let err = Error::from(SessionError::RefreshFailed(RefreshError::MissingRefreshToken));
        assert!(err.is_session_expired());
        assert!(err.is_unauthorized());

        let err = Error::from(SessionError::Unauthorized);
        assert!(!err.is_session_expired());
        assert!(err.is_unauthorized());

        let err = Error::api(401, String::new());
        assert!(!err.is_session_expired());
        assert!(err.is_unauthorized());
    }
}
