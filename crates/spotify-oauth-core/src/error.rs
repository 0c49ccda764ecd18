use std::error::Error;

use thiserror::Error;

/// Boxed error used for opaque transport and host failures.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Convenience alias for strategy operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Failures raised by the HTTP transport underneath the strategy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The in-flight request was aborted before completing.
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn request(err: impl Into<BoxError>) -> Self {
        Self::Request(err.into())
    }

    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Well-formed responses that do not honour the OAuth 2.0 contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// RFC 6749 error object (`{"error": "...", "error_description": "..."}`).
    #[error("{}", oauth_message(.error, .description, .status))]
    OAuth {
        error: String,
        description: Option<String>,
        status: Option<u16>,
    },
    #[error("token response did not contain an access_token")]
    MissingAccessToken,
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

fn oauth_message(error: &str, description: &Option<String>, status: &Option<u16>) -> String {
    let mut message = format!("oauth error `{error}`");
    if let Some(description) = description {
        message.push_str(": ");
        message.push_str(description);
    }
    if let Some(status) = status {
        message.push_str(&format!(" (status {status})"));
    }
    message
}

/// Errors surfaced to the host by the token and profile operations.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Profile endpoint could not be reached; wraps the transport failure.
    #[error("failed to fetch user profile")]
    ProfileFetch(#[source] TransportError),
    #[error("failed to decode {context} response: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("verify callback failed: {0}")]
    Verify(#[source] BoxError),
}

impl StrategyError {
    pub fn decode(context: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { context, source }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` when the failure happened while fetching the profile.
    pub fn is_profile_fetch(&self) -> bool {
        matches!(self, StrategyError::ProfileFetch(_))
    }

    /// Returns `true` when a response body was not valid JSON.
    pub fn is_decode(&self) -> bool {
        matches!(self, StrategyError::Decode { .. })
    }
}
