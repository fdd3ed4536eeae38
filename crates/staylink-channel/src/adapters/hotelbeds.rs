//! Hotelbeds channel adapter.
//!
//! Hotelbeds signs every request: `X-Signature` is the SHA-256 hex digest
//! of api key + api secret + current unix seconds, sent alongside
//! `Api-Key` and `X-Timestamp`.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use sha2::{Digest, Sha256};
use staylink_db::models::{
    ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan, ChannelType,
};
use tracing::debug;

use crate::adapters::http::{AuthScheme, HttpClient};
use crate::adapters::resolve_base_url;
use crate::error::{ChannelError, ChannelResult};
use crate::events::{CanonicalEvent, EventKind};
use crate::traits::ChannelAdapter;
use crate::types::{ConnectionTest, CredentialField};

const DEFAULT_BASE_URL: &str = "https://api.hotelbeds.com";

/// SHA-256 hex digest of key + secret + timestamp.
fn request_signature(api_key: &str, api_secret: &str, timestamp: i64) -> String {
    let digest = Sha256::digest(format!("{api_key}{api_secret}{timestamp}"));
    hex::encode(digest)
}

/// Adapter for the Hotelbeds APItude endpoints.
pub struct HotelbedsAdapter {
    http: HttpClient,
}

impl HotelbedsAdapter {
    pub fn new(http: HttpClient) -> Self {
        HotelbedsAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let api_key = CredentialField::ApiKey
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("api_key"))?;
        let api_secret = CredentialField::ApiSecret
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("api_secret"))?;

        let timestamp = chrono::Utc::now().timestamp();
        Ok(AuthScheme::Headers(vec![
            ("Api-Key".to_string(), api_key.to_string()),
            (
                "X-Signature".to_string(),
                request_signature(api_key, api_secret, timestamp),
            ),
            ("X-Timestamp".to_string(), timestamp.to_string()),
        ]))
    }

    fn url(&self, integration: &ChannelIntegration, path: &str) -> String {
        format!("{}{path}", resolve_base_url(integration, DEFAULT_BASE_URL))
    }
}

#[async_trait]
impl ChannelAdapter for HotelbedsAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Hotelbeds
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey, CredentialField::ApiSecret]
    }

    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        let auth = match self.auth(integration) {
            Ok(auth) => auth,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        let url = self.url(
            integration,
            "/hotel-content-api/1.0/hotels?fields=basic&from=1&to=1",
        );
        match self.http.get(&url, &auth).await {
            Ok(_) => ConnectionTest::ok(),
            Err(err) => ConnectionTest::failed(err.to_string()),
        }
    }

    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "pushing inventory to Hotelbeds");
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel": integration.hotel_id,
            "room": mapping.roomtype_id,
            "available": mapping.is_active,
        });
        self.http
            .post(&self.url(integration, "/hotel-api/1.0/inventory"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to Hotelbeds");
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel": integration.hotel_id,
            "room": rate_plan.roomtype_id,
            "rate": rate_plan.effective_rate(),
            "currency": rate_plan.currency,
        });
        self.http
            .post(&self.url(integration, "/hotel-api/1.0/rates"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "pushing availability to Hotelbeds");
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel": integration.hotel_id,
            "room": availability.roomtype_id,
            "date": availability.date.to_string(),
            "available": availability.available_rooms,
        });
        self.http
            .post(
                &self.url(integration, "/hotel-api/1.0/availability"),
                &auth,
                &body,
            )
            .await?;
        Ok(())
    }

    /// Hotelbeds webhooks carry no event taxonomy this side understands
    /// beyond the common aliases; the payload passes through for the
    /// caller's generic handling.
    async fn process_webhook(
        &self,
        _integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        match EventKind::classify_payload(payload) {
            EventKind::Unknown => {
                CanonicalEvent::new(EventKind::Unknown, payload.clone()).with_note("passthrough")
            }
            kind => CanonicalEvent::new(kind, payload.clone()),
        }
    }

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = self.url(integration, "/hotel-content-api/1.0/hotels");
        self.http.get(&url, &auth).await
    }
}
