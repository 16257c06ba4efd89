//! Error types for the EmpaMind client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback text shown when a failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to send message. Please try again.";

/// A shared error type for the entire EmpaMind client.
///
/// Transport failures are carried as typed variants so callers can branch on
/// them, and flattened to a single human-readable string with
/// [`EmpaMindError::user_message`] when they reach the conversation store.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmpaMindError {
    /// Input rejected before any state mutation (empty text, missing id, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("Request failed ({}): {message}", display_status(.status))]
    Request {
        status: Option<u16>,
        message: String,
    },

    /// The request did not complete within its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A streaming reveal was superseded before it finished
    #[error("Streaming reveal interrupted for message '{message_id}'")]
    StreamingInterrupted { message_id: String },

    /// Payload could not be decoded (base64, JSON body, ...)
    #[error("Decode error: {format} - {message}")]
    Decode { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "no status".to_string())
}

impl EmpaMindError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Request error
    pub fn request(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Creates a Decode error
    pub fn decode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn streaming_interrupted(message_id: impl Into<String>) -> Self {
        Self::StreamingInterrupted {
            message_id: message_id.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the transport (network, HTTP status or timeout)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Request { .. } | Self::Timeout(_)
        )
    }

    /// The text shown in the conversation's error banner.
    ///
    /// Network, request and timeout errors carry a message that is already
    /// meant for the user; everything else is prefixed by its category.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Validation(message)
            | Self::Network(message)
            | Self::Timeout(message)
            | Self::Request { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EmpaMindError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for EmpaMindError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EmpaMindError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML parse error: {err}"))
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for EmpaMindError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, EmpaMindError>`.
pub type Result<T> = std::result::Result<T, EmpaMindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_transport_text_through() {
        let err = EmpaMindError::network("Network error. Please check your connection.");
        assert_eq!(
            err.user_message(),
            "Network error. Please check your connection."
        );

        let err = EmpaMindError::request(Some(400), "title is required");
        assert_eq!(err.user_message(), "title is required");
    }

    #[test]
    fn test_user_message_falls_back_when_blank() {
        let err = EmpaMindError::request(Some(500), "   ");
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_transport_predicate() {
        assert!(EmpaMindError::timeout("slow").is_transport());
        assert!(EmpaMindError::request(None, "x").is_transport());
        assert!(!EmpaMindError::validation("empty").is_transport());
        assert!(!EmpaMindError::config("bad").is_transport());
    }

    #[test]
    fn test_request_display_includes_status() {
        let err = EmpaMindError::request(Some(404), "Chat not found");
        assert_eq!(err.to_string(), "Request failed (404): Chat not found");
    }
}
