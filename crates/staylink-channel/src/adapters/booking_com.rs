//! Booking.com channel adapter.
//!
//! Talks to the distribution API with a bearer token derived from the
//! integration's api key. Webhooks arrive keyed by `type` with lowercase
//! event names.

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
    first_str, inner_object, CanonicalEvent, EventKind, GuestRecord, ReservationDetails,
    StaySummary, RESERVATION_ID_KEYS,
};
use crate::traits::ChannelAdapter;
use crate::types::{ConnectionTest, CredentialField};

const DEFAULT_BASE_URL: &str = "https://distribution-xml.booking.com/2.4";

/// Adapter for the Booking.com distribution API.
pub struct BookingComAdapter {
    http: HttpClient,
}

impl BookingComAdapter {
    pub fn new(http: HttpClient) -> Self {
        BookingComAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let key = CredentialField::ApiKey
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("api_key"))?;
        Ok(AuthScheme::Bearer(key.to_string()))
    }

    fn url(&self, integration: &ChannelIntegration, path: &str) -> String {
        format!("{}{path}", resolve_base_url(integration, DEFAULT_BASE_URL))
    }

    fn source<'a>(&self, integration: &'a ChannelIntegration) -> &'a str {
        if integration.channel_name.trim().is_empty() {
            self.display_name()
        } else {
            &integration.channel_name
        }
    }
}

#[async_trait]
impl ChannelAdapter for BookingComAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::BookingCom
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey, CredentialField::ApiSecret]
    }

    /// Booking.com onboarding validates that credentials are present; the
    /// distribution API has no cheap probe endpoint.
    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        match self.missing_credentials(integration).first() {
            Some(field) => ConnectionTest::failed(format!("missing credential: {field}")),
            None => ConnectionTest::ok(),
        }
    }

    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(
            room_type = %mapping.channel_room_type_id,
            "pushing inventory to Booking.com"
        );
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel_id": property_id(integration),
            "room_type_id": mapping.channel_room_type_id,
            "action": "update",
            "inventory": {
                "room_type": mapping.channel_room_type_name,
                "description": mapping.channel_description.as_deref().unwrap_or(""),
                "active": mapping.is_active,
            },
        });
        self.http
            .post(&self.url(integration, "/v1/inventory"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(
            rate_plan = %rate_plan.channel_rate_plan_id,
            "pushing rates to Booking.com"
        );
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel_id": property_id(integration),
            "rate_plan_id": rate_plan.channel_rate_plan_id,
            "action": "update",
            "rates": {
                "base_rate": rate_plan.effective_rate(),
                "currency": rate_plan.currency,
            },
        });
        self.http
            .post(&self.url(integration, "/v1/rates"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "pushing availability to Booking.com");
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel_id": property_id(integration),
            "date": availability.date.to_string(),
            "action": "update",
            "availability": {
                "available_rooms": availability.available_rooms,
                "total_rooms": availability.total_rooms,
            },
        });
        self.http
            .post(&self.url(integration, "/v1/availability"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn process_webhook(
        &self,
        integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        let kind = EventKind::classify_payload(payload);
        let body = inner_object(payload);

        match kind {
            EventKind::Reservation | EventKind::Cancellation | EventKind::Modification => {
                let Some(stay) = StaySummary::from_payload(body) else {
                    return CanonicalEvent::new(kind, payload.clone())
                        .with_note("payload carried no stay details");
                };
                let guest = (kind == EventKind::Reservation
                    && (body.get("guest").is_some() || body.get("guest_name").is_some()))
                .then(|| {
                    GuestRecord::from_payload(
                        body,
                        integration.channel_property_id.as_deref(),
                        self.source(integration),
                    )
                });
                let details = ReservationDetails {
                    source_reservation_id: first_str(body, RESERVATION_ID_KEYS),
                    stay,
                    guest,
                    total_amount: None,
                    currency: None,
                };
                let mut event =
                    CanonicalEvent::new(kind, payload.clone()).with_reservation(details);
                if kind == EventKind::Modification {
                    if let Some(prior) = body.get("previous").and_then(StaySummary::from_payload) {
                        event = event.with_previous(prior);
                    }
                }
                event
            }
            EventKind::Unknown => CanonicalEvent::unknown(payload.clone()),
            other => CanonicalEvent::new(other, payload.clone()),
        }
    }

    async fn create_reservation(
        &self,
        integration: &ChannelIntegration,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let guest_name = details
            .guest
            .as_ref()
            .and_then(|g| g.full_name.as_deref())
            .unwrap_or("");
        let body = json!({
            "hotel_id": property_id(integration),
            "action": "create",
            "reservation": {
                "guest_name": guest_name,
                "check_in": details.stay.check_in.to_string(),
                "check_out": details.stay.check_out.to_string(),
                "room_type_id": details.stay.channel_room_code,
            },
        });
        self.http
            .post(&self.url(integration, "/v1/reservations"), &auth, &body)
            .await
    }

    async fn update_reservation(
        &self,
        integration: &ChannelIntegration,
        reservation_id: &str,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let body = json!({
            "hotel_id": property_id(integration),
            "reservation_id": reservation_id,
            "action": "update",
            "updates": {
                "check_in": details.stay.check_in.to_string(),
                "check_out": details.stay.check_out.to_string(),
                "rooms": details.stay.rooms,
            },
        });
        let url = self.url(integration, &format!("/v1/reservations/{reservation_id}"));
        self.http.put(&url, &auth, &body).await
    }

    async fn cancel_reservation(
        &self,
        integration: &ChannelIntegration,
        reservation_id: &str,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = self.url(integration, &format!("/v1/reservations/{reservation_id}"));
        self.http.delete(&url, &auth).await
    }

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = self.url(
            integration,
            &format!("/v1/hotels/{}", property_id(integration)),
        );
        self.http.get(&url, &auth).await
    }
}
