//! Error types for the synchronization engine.

use staylink_channel::error::ChannelError;
use staylink_db::models::{ChannelType, IntegrationStatus};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by sync operations, webhook processing and onboarding.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Database query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A channel adapter call failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Payload or snapshot serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested sync operation cannot be dispatched.
    #[error("unsupported sync operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// No integration exists for the given id.
    #[error("integration {id} not found")]
    IntegrationNotFound { id: Uuid },

    /// The integration is not in a state that allows syncing.
    #[error("integration {id} is not active (status: {status})")]
    NotSyncable { id: Uuid, status: IntegrationStatus },

    /// A hotel already has an integration for this channel type.
    #[error("hotel {hotel_id} already has a {channel_type} integration")]
    DuplicateIntegration {
        hotel_id: i64,
        channel_type: ChannelType,
    },

    /// No active platform-level configuration exists for the channel type.
    #[error("no active channel configuration for {channel_type}")]
    ChannelNotConfigured { channel_type: ChannelType },

    /// The connectivity test against the channel failed.
    #[error("connection test for {channel_type} failed: {message}")]
    ConnectionTestFailed {
        channel_type: ChannelType,
        message: String,
    },

    /// Unexpected internal failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    pub fn unsupported_operation(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    pub fn integration_not_found(id: Uuid) -> Self {
        Self::IntegrationNotFound { id }
    }

    pub fn not_syncable(id: Uuid, status: IntegrationStatus) -> Self {
        Self::NotSyncable { id, status }
    }

    pub fn duplicate_integration(hotel_id: i64, channel_type: ChannelType) -> Self {
        Self::DuplicateIntegration {
            hotel_id,
            channel_type,
        }
    }

    pub fn channel_not_configured(channel_type: ChannelType) -> Self {
        Self::ChannelNotConfigured { channel_type }
    }

    pub fn connection_test_failed(channel_type: ChannelType, message: impl Into<String>) -> Self {
        Self::ConnectionTestFailed {
            channel_type,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code recorded on failed sync logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Channel(err) => err.error_code(),
            _ => "SYNC_ERROR",
        }
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) => true,
            Self::Channel(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Result alias used across the sync crate.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::unsupported_operation("booking_create");
        assert_eq!(err.to_string(), "unsupported sync operation: booking_create");

        let id = Uuid::nil();
        let err = SyncError::not_syncable(id, IntegrationStatus::Pending);
        assert!(err.to_string().contains("not active"));
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_error_code_passes_channel_codes_through() {
        let err = SyncError::Channel(ChannelError::AuthenticationFailed);
        assert_eq!(err.error_code(), "AUTH_FAILED");

        let err = SyncError::unsupported_operation("mapping_update");
        assert_eq!(err.error_code(), "SYNC_ERROR");

        let err = SyncError::duplicate_integration(1, ChannelType::BookingCom);
        assert_eq!(err.error_code(), "SYNC_ERROR");
    }

    #[test]
    fn test_is_retryable() {
        assert!(SyncError::Channel(ChannelError::Timeout {
            message: "timed out".into()
        })
        .is_retryable());
        assert!(!SyncError::Channel(ChannelError::AuthenticationFailed).is_retryable());
        assert!(!SyncError::integration_not_found(Uuid::nil()).is_retryable());
    }

    #[test]
    fn test_channel_error_converts() {
        fn fails() -> SyncResult<()> {
            Err(ChannelError::unsupported_operation("create_reservation", "booking_com"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, SyncError::Channel(_)));
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
    }
}
