//! TripAdvisor channel adapter. The one vendor that sends review events
//! alongside bookings.

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

const DEFAULT_BASE_URL: &str = "https://api.tripadvisor.com/v1";

pub struct TripadvisorAdapter {
    http: HttpClient,
}

impl TripadvisorAdapter {
    pub fn new(http: HttpClient) -> Self {
        TripadvisorAdapter { http }
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
impl ChannelAdapter for TripadvisorAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Tripadvisor
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

    /// Inventory maps onto TripAdvisor property listings.
    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "pushing listing to TripAdvisor");
        let auth = self.auth(integration)?;
        let body = json!({
            "listing": {
                "roomTypeId": mapping.channel_room_type_id,
                "name": mapping.channel_room_type_name,
                "description": mapping.channel_description,
                "images": mapping.channel_images,
            },
        });
        self.http
            .put(&self.hotel_url(integration, "/listings"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to TripAdvisor");
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
        debug!(date = %availability.date, "pushing availability to TripAdvisor");
        let auth = self.auth(integration)?;
        let body = json!({
            "date": availability.date.to_string(),
            "availableRooms": availability.available_rooms,
            "status": availability.status.to_string(),
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
        let body = inner_object(payload);

        match kind {
            // Reviews carry no stay; keep the payload for downstream
            // consumers and record the review id when present.
            EventKind::Review => {
                let mut event = CanonicalEvent::new(kind, payload.clone());
                if let Some(review_id) = first_str(body, &["review_id", "id"]) {
                    event = event.with_note(format!("review {review_id}"));
                }
                event
            }
            EventKind::Reservation | EventKind::Cancellation | EventKind::Modification => {
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

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        self.http.get(&self.hotel_url(integration, ""), &auth).await
    }
}
