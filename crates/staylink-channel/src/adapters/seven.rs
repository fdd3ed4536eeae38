//! Seven channel adapter.
//!
//! Property-scoped endpoints under `/properties/{id}`, authenticated with
//! a bearer token from the api key. Seven is the channel whose webhooks
//! carry full guest details, so its canonicalization is the richest:
//! reservation summary, guest record with normalized phone and payment
//! defaults, and source attribution for the PMS.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use staylink_db::models::{
    ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan, ChannelType,
};
use tracing::{debug, info};

use crate::adapters::http::{AuthScheme, HttpClient};
use crate::adapters::{property_id, resolve_base_url};
use crate::error::{ChannelError, ChannelResult};
use crate::events::{
    first_decimal, first_str, inner_object, CanonicalEvent, EventKind, GuestRecord,
    ReservationDetails, StaySummary, RESERVATION_ID_KEYS,
};
use crate::traits::ChannelAdapter;
use crate::types::{ConnectionTest, CredentialField};

const DEFAULT_BASE_URL: &str = "https://api.7even.com/v1";

/// Adapter for the Seven property API.
pub struct SevenAdapter {
    http: HttpClient,
}

impl SevenAdapter {
    pub fn new(http: HttpClient) -> Self {
        SevenAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let key = CredentialField::ApiKey
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("api_key"))?;
        Ok(AuthScheme::Bearer(key.to_string()))
    }

    fn property_url(&self, integration: &ChannelIntegration, suffix: &str) -> String {
        format!(
            "{}/properties/{}{suffix}",
            resolve_base_url(integration, DEFAULT_BASE_URL),
            property_id(integration)
        )
    }

    /// Booking source recorded on forwarded guests: the integration's
    /// display name, falling back to the raw channel type.
    fn source(&self, integration: &ChannelIntegration) -> String {
        if integration.channel_name.trim().is_empty() {
            integration.channel_type.to_string()
        } else {
            integration.channel_name.clone()
        }
    }

    fn booking_event(
        &self,
        integration: &ChannelIntegration,
        kind: EventKind,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        let body = inner_object(payload);
        let Some(stay) = StaySummary::from_payload(body) else {
            return CanonicalEvent::new(kind, payload.clone())
                .with_note("payload carried no stay details");
        };

        let guest = (kind == EventKind::Reservation).then(|| {
            GuestRecord::from_payload(
                body,
                integration.channel_property_id.as_deref(),
                &self.source(integration),
            )
        });

        let details = ReservationDetails {
            source_reservation_id: first_str(body, RESERVATION_ID_KEYS),
            stay,
            guest,
            total_amount: first_decimal(body, &["total_amount", "totalAmount"]),
            currency: first_str(body, &["currency"]),
        };

        let mut event = CanonicalEvent::new(kind, payload.clone()).with_reservation(details);
        if kind == EventKind::Modification {
            if let Some(prior) = body.get("previous").and_then(StaySummary::from_payload) {
                event = event.with_previous(prior);
            }
        }
        event
    }
}

#[async_trait]
impl ChannelAdapter for SevenAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Seven
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::ApiKey, CredentialField::PropertyId]
    }

    /// Integrations in test mode skip the external probe entirely; they
    /// exist to exercise the pipeline without a live Seven account.
    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        if let Some(field) = self.missing_credentials(integration).first() {
            return ConnectionTest::failed(format!("missing credential: {field}"));
        }
        if integration.test_mode {
            info!(integration_id = %integration.id, "test mode, skipping Seven connectivity probe");
            return ConnectionTest::ok();
        }
        let auth = match self.auth(integration) {
            Ok(auth) => auth,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        match self
            .http
            .get(&self.property_url(integration, "/status"), &auth)
            .await
        {
            Ok(_) => ConnectionTest::ok(),
            Err(err) => ConnectionTest::failed(err.to_string()),
        }
    }

    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "pushing inventory to Seven");
        let auth = self.auth(integration)?;
        let body = json!({
            "room_type_id": mapping.channel_room_type_id,
            "name": mapping.channel_room_type_name,
            "description": mapping.channel_description,
            "amenities": mapping.channel_amenities,
            "active": mapping.is_active,
        });
        self.http
            .post(&self.property_url(integration, "/inventory"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_rates(
        &self,
        integration: &ChannelIntegration,
        rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to Seven");
        let auth = self.auth(integration)?;
        let body = json!({
            "rate_plan_id": rate_plan.channel_rate_plan_id,
            "rate": rate_plan.effective_rate(),
            "currency": rate_plan.currency,
            "min_stay": rate_plan.min_stay,
            "closed_to_arrival": rate_plan.closed_to_arrival,
            "closed_to_departure": rate_plan.closed_to_departure,
        });
        self.http
            .post(&self.property_url(integration, "/rates"), &auth, &body)
            .await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "pushing availability to Seven");
        let auth = self.auth(integration)?;
        let body = json!({
            "room": availability.roomtype_id,
            "date": availability.date.to_string(),
            "available": availability.available_rooms,
            "total": availability.total_rooms,
            "closed": availability.is_closed,
        });
        self.http
            .post(
                &self.property_url(integration, "/availability"),
                &auth,
                &body,
            )
            .await?;
        Ok(())
    }

    async fn process_webhook(
        &self,
        integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        match EventKind::classify_payload(payload) {
            kind @ (EventKind::Reservation | EventKind::Cancellation | EventKind::Modification) => {
                self.booking_event(integration, kind, payload)
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
        let guest = details.guest.as_ref();
        let body = json!({
            "room_type_id": details.stay.channel_room_code,
            "check_in": details.stay.check_in.to_string(),
            "check_out": details.stay.check_out.to_string(),
            "rooms": details.stay.rooms,
            "guest": {
                "name": guest.and_then(|g| g.full_name.as_deref()),
                "email": guest.and_then(|g| g.email.as_deref()),
                "phone": guest.and_then(|g| g.phone.as_deref()),
            },
        });
        self.http
            .post(
                &self.property_url(integration, "/reservations"),
                &auth,
                &body,
            )
            .await
    }

    async fn update_reservation(
        &self,
        integration: &ChannelIntegration,
        reservation_id: &str,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = self.property_url(integration, &format!("/reservations/{reservation_id}"));
        let body = json!({
            "check_in": details.stay.check_in.to_string(),
            "check_out": details.stay.check_out.to_string(),
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
        let url = self.property_url(integration, &format!("/reservations/{reservation_id}"));
        self.http.delete(&url, &auth).await
    }

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        self.http
            .get(&self.property_url(integration, ""), &auth)
            .await
    }
}
