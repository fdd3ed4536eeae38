//! Core trait for channel adapters.
//!
//! This module defines the [`ChannelAdapter`] trait that all distribution
//! channel adapters must implement. One implementation exists per supported
//! channel type; the registry hands out trait objects.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use staylink_db::models::{ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan, ChannelType};

use crate::error::{ChannelError, ChannelResult};
use crate::events::{CanonicalEvent, ReservationDetails};
use crate::registry;
use crate::types::{ChannelInfo, ConnectionTest, CredentialField};

/// Interface every distribution channel adapter implements.
///
/// Push operations take a single record so the caller can isolate failures
/// per item. Webhook processing is total: malformed payloads come back as
/// `Unknown` events, never as errors.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel type this adapter serves.
    fn channel_type(&self) -> ChannelType;

    /// Human-readable channel name.
    fn display_name(&self) -> &'static str {
        registry::display_name(self.channel_type())
    }

    /// Capabilities of this channel, for user-facing discovery.
    fn supported_features(&self) -> &'static [&'static str] {
        registry::features_of(self.channel_type())
    }

    /// Credential fields this adapter needs on the integration record.
    fn required_credentials(&self) -> &'static [CredentialField] {
        &[]
    }

    /// Required credential fields the integration does not carry.
    fn missing_credentials(&self, integration: &ChannelIntegration) -> Vec<CredentialField> {
        self.required_credentials()
            .iter()
            .copied()
            .filter(|field| field.value_of(integration).is_none())
            .collect()
    }

    /// Static overview of this channel.
    fn overview(&self) -> ChannelInfo {
        ChannelInfo {
            channel_type: self.channel_type(),
            display_name: self.display_name(),
            features: self.supported_features(),
        }
    }

    /// Probe the channel API with the integration's credentials.
    ///
    /// # Arguments
    ///
    /// * `integration` - The integration whose credentials to test
    ///
    /// # Returns
    ///
    /// A result object with `success` and an optional error detail. This
    /// method never errors: transport and credential failures are folded
    /// into the result object.
    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest;

    /// Whether the integration's credentials are accepted by the channel.
    async fn validate_credentials(&self, integration: &ChannelIntegration) -> bool {
        self.test_connection(integration).await.success
    }

    /// Push one room-type mapping to the channel.
    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()>;

    /// Push one rate plan to the channel.
    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()>;

    /// Push one availability row to the channel.
    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()>;

    /// Reduce a raw vendor webhook payload to a canonical event.
    ///
    /// # Arguments
    ///
    /// * `integration` - The integration the webhook arrived for
    /// * `payload` - The payload exactly as received
    ///
    /// # Returns
    ///
    /// A canonical event. Payloads the adapter cannot make sense of come
    /// back with kind `Unknown` and a note, never as an error.
    async fn process_webhook(
        &self,
        integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent;

    /// Create a reservation on the channel side.
    async fn create_reservation(
        &self,
        _integration: &ChannelIntegration,
        _details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        Err(ChannelError::unsupported_operation(
            "create_reservation",
            self.display_name(),
        ))
    }

    /// Update a reservation on the channel side.
    async fn update_reservation(
        &self,
        _integration: &ChannelIntegration,
        _reservation_id: &str,
        _details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        Err(ChannelError::unsupported_operation(
            "update_reservation",
            self.display_name(),
        ))
    }

    /// Cancel a reservation on the channel side.
    async fn cancel_reservation(
        &self,
        _integration: &ChannelIntegration,
        _reservation_id: &str,
    ) -> ChannelResult<JsonValue> {
        Err(ChannelError::unsupported_operation(
            "cancel_reservation",
            self.display_name(),
        ))
    }

    /// Fetch vendor-side metadata about the connected property. The
    /// default returns the static overview.
    async fn channel_info(
        &self,
        _integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        Ok(json!({
            "channel_type": self.channel_type().to_string(),
            "display_name": self.display_name(),
            "features": self.supported_features(),
        }))
    }
}

impl std::fmt::Debug for dyn ChannelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAdapter")
            .field("channel_type", &self.channel_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staylink_db::models::IntegrationStatus;

    /// Minimal adapter used to exercise the default method implementations.
    struct MockAdapter;

    #[async_trait]
    impl ChannelAdapter for MockAdapter {
        fn channel_type(&self) -> ChannelType {
            ChannelType::Custom
        }

        fn required_credentials(&self) -> &'static [CredentialField] {
            &[CredentialField::ApiKey, CredentialField::PropertyId]
        }

        async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
            match self.missing_credentials(integration).first() {
                Some(field) => ConnectionTest::failed(format!("missing credential: {field}")),
                None => ConnectionTest::ok(),
            }
        }

        async fn update_inventory(
            &self,
            _integration: &ChannelIntegration,
            _mapping: &ChannelMapping,
        ) -> ChannelResult<()> {
            Ok(())
        }

        async fn update_rates(
            &self,
            _integration: &ChannelIntegration,
            _rate_plan: &ChannelRatePlan,
        ) -> ChannelResult<()> {
            Ok(())
        }

        async fn update_availability(
            &self,
            _integration: &ChannelIntegration,
            _availability: &ChannelAvailability,
        ) -> ChannelResult<()> {
            Ok(())
        }

        async fn process_webhook(
            &self,
            _integration: &ChannelIntegration,
            payload: &JsonValue,
        ) -> CanonicalEvent {
            CanonicalEvent::unknown(payload.clone())
        }
    }

    fn test_integration() -> ChannelIntegration {
        ChannelIntegration {
            id: uuid::Uuid::new_v4(),
            hotel_id: 42,
            channel_type: ChannelType::Custom,
            channel_name: "Direct connect".to_string(),
            status: IntegrationStatus::Active,
            api_key: Some("key-123".to_string()),
            api_secret: None,
            access_token: None,
            refresh_token: None,
            channel_property_id: Some("PROP-1".to_string()),
            channel_username: None,
            channel_password: None,
            webhook_url: None,
            webhook_secret: None,
            is_webhook_enabled: false,
            sync_interval_minutes: 15,
            is_real_time_sync: false,
            last_sync_at: None,
            last_successful_sync: None,
            error_message: None,
            test_mode: false,
            channel_settings: None,
            supported_features: None,
            created_by: None,
            updated_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_validate_credentials_follows_connection_test() {
        let adapter = MockAdapter;
        let integration = test_integration();
        assert!(adapter.validate_credentials(&integration).await);

        let mut without_key = test_integration();
        without_key.api_key = None;
        assert!(!adapter.validate_credentials(&without_key).await);
    }

    #[tokio::test]
    async fn test_missing_credentials_reports_blank_fields() {
        let adapter = MockAdapter;
        let mut integration = test_integration();
        integration.api_key = Some("   ".to_string());

        let missing = adapter.missing_credentials(&integration);
        assert_eq!(missing, vec![CredentialField::ApiKey]);
    }

    #[tokio::test]
    async fn test_reservation_defaults_are_unsupported() {
        let adapter = MockAdapter;
        let integration = test_integration();

        let err = adapter
            .cancel_reservation(&integration, "R-1")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
    }

    #[tokio::test]
    async fn test_default_channel_info_carries_overview() {
        let adapter = MockAdapter;
        let integration = test_integration();

        let info = adapter.channel_info(&integration).await.unwrap();
        assert_eq!(info["channel_type"], "custom");
        assert!(info["features"].is_array());
    }

    #[tokio::test]
    async fn test_overview_matches_registry_metadata() {
        let adapter = MockAdapter;
        let overview = adapter.overview();
        assert_eq!(overview.channel_type, ChannelType::Custom);
        assert_eq!(overview.display_name, "Custom Integration");
    }
}
