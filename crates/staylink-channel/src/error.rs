//! Channel adapter error types.
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

/// Error that can occur while talking to a distribution channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the channel.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Channel is temporarily unavailable.
    #[error("channel unavailable: {message}")]
    ChannelUnavailable { message: String },

    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Channel asked us to slow down.
    #[error("rate limited by channel")]
    RateLimited { retry_after_secs: Option<u64> },

    // Authentication errors (permanent)
    /// Channel rejected the credentials.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Credentials have expired.
    #[error("authentication failed: credentials expired")]
    CredentialsExpired,

    /// A required credential is missing from the integration.
    #[error("missing credential: {field}")]
    MissingCredential { field: String },

    // Configuration errors (permanent)
    /// No adapter is registered for the channel type.
    #[error("unsupported channel type: {channel_type}")]
    UnsupportedChannel { channel_type: String },

    /// The adapter cannot perform the requested operation.
    #[error("operation '{operation}' not supported by {channel}")]
    UnsupportedOperation { operation: String, channel: String },

    /// Adapter configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Data errors
    /// Inbound payload could not be understood.
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },

    /// Channel accepted the request but rejected its content.
    #[error("channel rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Serialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    // Internal errors
    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ChannelError {
    /// Check if this error is transient and the operation should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChannelError::ConnectionFailed { .. }
                | ChannelError::Timeout { .. }
                | ChannelError::ChannelUnavailable { .. }
                | ChannelError::NetworkError { .. }
                | ChannelError::RateLimited { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            ChannelError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ChannelError::Timeout { .. } => "TIMEOUT",
            ChannelError::ChannelUnavailable { .. } => "CHANNEL_UNAVAILABLE",
            ChannelError::NetworkError { .. } => "NETWORK_ERROR",
            ChannelError::RateLimited { .. } => "RATE_LIMITED",
            ChannelError::AuthenticationFailed => "AUTH_FAILED",
            ChannelError::CredentialsExpired => "CREDENTIALS_EXPIRED",
            ChannelError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            ChannelError::UnsupportedChannel { .. } => "UNSUPPORTED_CHANNEL",
            ChannelError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ChannelError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ChannelError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            ChannelError::Rejected { .. } => "REJECTED",
            ChannelError::Serialization { .. } => "SERIALIZATION_ERROR",
            ChannelError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ChannelError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ChannelError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ChannelError::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ChannelError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        ChannelError::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ChannelError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a missing credential error.
    pub fn missing_credential(field: impl Into<String>) -> Self {
        ChannelError::MissingCredential {
            field: field.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported_operation(
        operation: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        ChannelError::UnsupportedOperation {
            operation: operation.into(),
            channel: channel.into(),
        }
    }

    /// Create a rejection error from an HTTP status and body.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ChannelError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ChannelError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
