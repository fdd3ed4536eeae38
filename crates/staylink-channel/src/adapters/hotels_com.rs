//! Hotels.com channel adapter.

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

const DEFAULT_BASE_URL: &str = "https://api.hotels.com/v1";

pub struct HotelsComAdapter {
    http: HttpClient,
}

impl HotelsComAdapter {
    pub fn new(http: HttpClient) -> Self {
        HotelsComAdapter { http }
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
impl ChannelAdapter for HotelsComAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::HotelsCom
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
        match self.http.get(&self.hotel_url(integration, ""), &auth).await {
            Ok(_) => ConnectionTest::ok(),
            Err(err) => ConnectionTest::failed(err.to_string()),
        }
    }

    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "pushing inventory to Hotels.com");
        let auth = self.auth(integration)?;
        let url = self.hotel_url(
            integration,
            &format!("/room-types/{}", mapping.channel_room_type_id),
        );
        let body = json!({
            "name": mapping.channel_room_type_name,
            "description": mapping.channel_description,
            "active": mapping.is_active,
        });
        self.http.put(&url, &auth, &body).await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to Hotels.com");
        let auth = self.auth(integration)?;
        let body = json!({
            "ratePlanId": rate_plan.channel_rate_plan_id,
            "rate": rate_plan.effective_rate(),
            "currency": rate_plan.currency,
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
        debug!(date = %availability.date, "pushing availability to Hotels.com");
        let auth = self.auth(integration)?;
        let body = json!({
            "date": availability.date.to_string(),
            "available": availability.available_rooms,
            "total": availability.total_rooms,
            "closed": availability.is_closed,
        });
        self.http
            .post(&self.hotel_url(integration, "/availability"), &auth, &body)
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
            "{}/bookings",
            resolve_base_url(integration, DEFAULT_BASE_URL)
        );
        let body = json!({
            "hotelId": property_id(integration),
            "roomTypeId": details.stay.channel_room_code,
            "checkIn": details.stay.check_in.to_string(),
            "checkOut": details.stay.check_out.to_string(),
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
            "{}/bookings/{reservation_id}",
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
