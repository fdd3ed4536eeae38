//! Expedia channel adapter. EAN-style endpoints scoped under the property
//! id, authenticated with the integration's access token.

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

const DEFAULT_BASE_URL: &str = "https://api.ean.com/v3";

/// Adapter for the Expedia partner API.
pub struct ExpediaAdapter {
    http: HttpClient,
}

impl ExpediaAdapter {
    pub fn new(http: HttpClient) -> Self {
        ExpediaAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let token = CredentialField::AccessToken
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("access_token"))?;
        Ok(AuthScheme::Bearer(token.to_string()))
    }

    fn hotel_url(&self, integration: &ChannelIntegration, suffix: &str) -> String {
        format!(
            "{}/hotels/{}{suffix}",
            resolve_base_url(integration, DEFAULT_BASE_URL),
            property_id(integration)
        )
    }
}

#[async_trait]
impl ChannelAdapter for ExpediaAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Expedia
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::AccessToken, CredentialField::PropertyId]
    }

    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        if let Some(field) = self.missing_credentials(integration).first() {
            return ConnectionTest::failed(format!("missing credential: {field}"));
        }
        let auth = match self.auth(integration) {
            Ok(auth) => auth,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        let url = format!("{}/hotels", resolve_base_url(integration, DEFAULT_BASE_URL));
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
        debug!(room_type = %mapping.channel_room_type_id, "pushing inventory to Expedia");
        let auth = self.auth(integration)?;
        let url = self.hotel_url(
            integration,
            &format!("/room-types/{}", mapping.channel_room_type_id),
        );
        let body = json!({
            "roomType": {
                "name": mapping.channel_room_type_name,
                "description": mapping.channel_description,
                "status": if mapping.is_active { "active" } else { "inactive" },
            },
        });
        self.http.put(&url, &auth, &body).await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to Expedia");
        let auth = self.auth(integration)?;
        let body = json!({
            "ratePlans": [{
                "ratePlanId": rate_plan.channel_rate_plan_id,
                "baseRate": rate_plan.effective_rate(),
                "currency": rate_plan.currency,
                "minStay": rate_plan.min_stay,
                "maxStay": rate_plan.max_stay,
            }],
        });
        self.http
            .post(&self.hotel_url(integration, "/rates"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "pushing availability to Expedia");
        let auth = self.auth(integration)?;
        let body = json!({
            "availability": [{
                "date": availability.date.to_string(),
                "roomsAvailable": availability.available_rooms,
                "closed": availability.is_closed,
            }],
        });
        self.http
            .post(&self.hotel_url(integration, "/availability"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn process_webhook(
        &self,
        integration: &ChannelIntegration,
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
        let Some(stay) = StaySummary::from_payload(body) else {
            return CanonicalEvent::new(kind, payload.clone())
                .with_note("payload carried no stay details");
        };
        let guest = (kind == EventKind::Reservation && body.get("guest_name").is_some()).then(
            || {
                GuestRecord::from_payload(
                    body,
                    integration.channel_property_id.as_deref(),
                    "Expedia",
                )
            },
        );
        CanonicalEvent::new(kind, payload.clone()).with_reservation(ReservationDetails {
            source_reservation_id: first_str(body, RESERVATION_ID_KEYS),
            stay,
            guest,
            total_amount: None,
            currency: None,
        })
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
            "hotelId": property_id(integration),
            "roomTypeId": details.stay.channel_room_code,
            "checkIn": details.stay.check_in.to_string(),
            "checkOut": details.stay.check_out.to_string(),
            "rooms": details.stay.rooms,
        });
        self.http.post(&url, &auth, &body).await
    }

    async fn update_reservation(
        &self,
        integration: &ChannelIntegration,
        reservation_id: &str,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = format!(
            "{}/reservations/{reservation_id}",
            resolve_base_url(integration, DEFAULT_BASE_URL)
        );
        let body = json!({
            "checkIn": details.stay.check_in.to_string(),
            "checkOut": details.stay.check_out.to_string(),
            "rooms": details.stay.rooms,
        });
        self.http.put(&url, &auth, &body).await
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
        self.http.get(&self.hotel_url(integration, ""), &auth).await
    }
}
