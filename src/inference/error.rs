//! Inference error types

use thiserror::Error;

/// Inference failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InferenceError {
    pub kind: InferenceErrorKind,
    pub message: String,
}

impl InferenceError {
    pub fn new(kind: InferenceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Network, message)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Throttled, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::ServerError, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Rejected, message)
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::MalformedBody, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceErrorKind {
    /// Connect or read deadline exceeded
    Timeout,
    /// Connection refused, reset, DNS failure
    Network,
    /// Backend is shedding load (429)
    Throttled,
    /// Backend failed (5xx)
    ServerError,
    /// Backend refused the request (4xx other than 429)
    Rejected,
    /// Response body was not JSON
    MalformedBody,
    Unknown,
}

impl InferenceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Throttled => "throttled",
            Self::ServerError => "server_error",
            Self::Rejected => "rejected",
            Self::MalformedBody => "malformed_body",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a later attempt could plausibly succeed.
    ///
    /// Only reported in logs; the client never retries on its own.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network | Self::Throttled | Self::ServerError
        )
    }
}
