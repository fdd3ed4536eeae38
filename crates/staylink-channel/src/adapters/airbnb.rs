//! Airbnb channel adapter. Listing-scoped endpoints with the api key in
//! an `X-Airbnb-API-Key` header.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use staylink_db::models::{
    ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan, ChannelType,
};
use tracing::debug;

use crate::adapters::http::{AuthScheme, HttpClient};
use crate::adapters::{property_id, resolve_base_url};
use crate::error::{ChannelError, ChannelResult};
use crate::events::{
    first_str, inner_object, CanonicalEvent, EventKind, ReservationDetails, StaySummary,
    RESERVATION_ID_KEYS,
};
use crate::traits::ChannelAdapter;
use crate::types::{ConnectionTest, CredentialField};

const DEFAULT_BASE_URL: &str = "https://api.airbnb.com/v2";

/// Adapter for the Airbnb listing API.
pub struct AirbnbAdapter {
    http: HttpClient,
}

impl AirbnbAdapter {
    pub fn new(http: HttpClient) -> Self {
        AirbnbAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let key = CredentialField::ApiKey
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("api_key"))?;
        Ok(AuthScheme::ApiKey {
            header: "X-Airbnb-API-Key".to_string(),
            key: key.to_string(),
        })
    }

    fn listing_url(&self, integration: &ChannelIntegration, suffix: &str) -> String {
        format!(
            "{}/listings/{}{suffix}",
            resolve_base_url(integration, DEFAULT_BASE_URL),
            property_id(integration)
        )
    }
}

#[async_trait]
impl ChannelAdapter for AirbnbAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Airbnb
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey, CredentialField::PropertyId]
    }

    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        if let Some(field) = self.missing_credentials(integration).first() {
            return ConnectionTest::failed(format!("missing credential: {field}"));
        }
        let auth = match self.auth(integration) {
            Ok(auth) => auth,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        match self.http.get(&self.listing_url(integration, ""), &auth).await {
            Ok(_) => ConnectionTest::ok(),
            Err(err) => ConnectionTest::failed(err.to_string()),
        }
    }

    /// Airbnb has no separate room-type resource; inventory pushes update
    /// the listing itself.
    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "updating Airbnb listing");
        let auth = self.auth(integration)?;
        let body = json!({
            "listing": {
                "name": mapping.channel_room_type_name,
                "description": mapping.channel_description,
                "amenities": mapping.channel_amenities,
                "active": mapping.is_active,
            },
        });
        self.http
            .put(&self.listing_url(integration, ""), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "updating Airbnb pricing");
        let auth = self.auth(integration)?;
        let body = json!({
            "pricing": {
                "nightly_price": rate_plan.effective_rate(),
                "currency": rate_plan.currency,
                "min_nights": rate_plan.min_stay,
                "max_nights": rate_plan.max_stay,
            },
        });
        self.http
            .put(&self.listing_url(integration, "/pricing"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "updating Airbnb calendar");
        let auth = self.auth(integration)?;
        let body = json!({
            "calendar": {
                "date": availability.date.to_string(),
                "available": availability.available_rooms > 0 && !availability.is_closed,
                "price": availability.rate,
            },
        });
        self.http
            .put(&self.listing_url(integration, "/calendar"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn process_webhook(
        &self,
        _integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        let kind = EventKind::classify_payload(payload);
        if !kind.is_booking_event() {
            return match kind {
                EventKind::Unknown => CanonicalEvent::unknown(payload.clone()),
                other => CanonicalEvent::new(other, payload.clone()),
            };
        }

        let body = inner_object(payload);
        match StaySummary::from_payload(body) {
            Some(stay) => CanonicalEvent::new(kind, payload.clone()).with_reservation(
                ReservationDetails {
                    source_reservation_id: first_str(body, RESERVATION_ID_KEYS),
                    stay,
                    guest: None,
                    total_amount: None,
                    currency: None,
                },
            ),
            None => CanonicalEvent::new(kind, payload.clone())
                .with_note("payload carried no stay details"),
        }
    }

    async fn create_reservation(
        &self,
        integration: &ChannelIntegration,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = format!(
            "{}/reservations",
            resolve_base_url(integration, DEFAULT_BASE_URL)
        );
        let body = json!({
            "listing_id": property_id(integration),
            "check_in": details.stay.check_in.to_string(),
            "check_out": details.stay.check_out.to_string(),
            "guests": details.guest.as_ref().map_or(1, |g| g.number_of_guests),
        });
        self.http.post(&url, &auth, &body).await
    }

    async fn cancel_reservation(
        &self,
        integration: &ChannelIntegration,
        reservation_id: &str,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = format!(
            "{}/reservations/{reservation_id}",
            resolve_base_url(integration, DEFAULT_BASE_URL)
        );
        self.http.delete(&url, &auth).await
    }

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        self.http
            .get(&self.listing_url(integration, ""), &auth)
            .await
    }
}
