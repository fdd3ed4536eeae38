//! Custom integration adapter.
//!
//! For properties connecting a partner system that is not one of the
//! named OTAs. The endpoint comes from the integration's settings
//! (`api_endpoint`), falling back to the configured webhook URL, and
//! every call carries the integration's access token as a bearer.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use staylink_db::models::{
    AvailabilityStatus, ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan,
    ChannelType,
};
use tracing::debug;

use crate::adapters::http::{AuthScheme, HttpClient};
use crate::adapters::settings_str;
use crate::error::{ChannelError, ChannelResult};
use crate::events::{first_str, inner_object, CanonicalEvent, EventKind, ReservationDetails};
use crate::traits::ChannelAdapter;
use crate::types::{ConnectionTest, CredentialField};

pub struct CustomAdapter {
    http: HttpClient,
}

impl CustomAdapter {
    pub fn new(http: HttpClient) -> Self {
        CustomAdapter { http }
    }

    fn auth(&self, integration: &ChannelIntegration) -> ChannelResult<AuthScheme> {
        let token = CredentialField::AccessToken
            .value_of(integration)
            .ok_or_else(|| ChannelError::missing_credential("access_token"))?;
        Ok(AuthScheme::Bearer(token.to_string()))
    }

    /// Endpoint resolution: `api_endpoint` from the settings blob wins,
    /// then the webhook URL. An integration with neither cannot be used.
    fn endpoint(&self, integration: &ChannelIntegration) -> ChannelResult<String> {
        settings_str(integration, "api_endpoint")
            .or_else(|| settings_str(integration, "apiEndpoint"))
            .or_else(|| {
                integration
                    .webhook_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
            })
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| ChannelError::invalid_configuration("no API endpoint configured"))
    }
}

#[async_trait]
impl ChannelAdapter for CustomAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Custom
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        &[CredentialField::AccessToken]
    }

    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        if let Some(field) = self.missing_credentials(integration).first() {
            return ConnectionTest::failed(format!("missing credential: {field}"));
        }
        let endpoint = match self.endpoint(integration) {
            Ok(endpoint) => endpoint,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        let auth = match self.auth(integration) {
            Ok(auth) => auth,
            Err(err) => return ConnectionTest::failed(err.to_string()),
        };
        match self.http.get(&format!("{endpoint}/health"), &auth).await {
            Ok(_) => ConnectionTest::ok(),
            Err(err) => ConnectionTest::failed(err.to_string()),
        }
    }

    async fn update_inventory(
        &self,
        integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        debug!(room_type = %mapping.channel_room_type_id, "pushing inventory to custom endpoint");
        let auth = self.auth(integration)?;
        let url = format!(
            "{}/inventory/{}",
            self.endpoint(integration)?,
            mapping.channel_room_type_id
        );
        let body = json!({
            "room_type": {
                "id": mapping.channel_room_type_id,
                "name": mapping.channel_room_type_name,
                "description": mapping.channel_description.as_deref().unwrap_or(""),
                "amenities": mapping.channel_amenities.as_deref().unwrap_or(&[]),
                "images": mapping.channel_images.as_deref().unwrap_or(&[]),
                "custom_fields": mapping.custom_fields.clone().unwrap_or_else(|| json!({})),
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
        debug!(rate_plan = %rate_plan.channel_rate_plan_id, "pushing rates to custom endpoint");
        let auth = self.auth(integration)?;
        let url = format!(
            "{}/rates/{}",
            self.endpoint(integration)?,
            rate_plan.channel_rate_plan_id
        );
        let body = json!({
            "rate_plan": {
                "id": rate_plan.channel_rate_plan_id,
                "name": rate_plan.channel_rate_plan_name,
                "base_rate": rate_plan.effective_rate(),
                "currency": rate_plan.currency,
            },
        });
        self.http.put(&url, &auth, &body).await?;
        Ok(())
    }

    async fn update_availability(
        &self,
        integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        debug!(date = %availability.date, "pushing availability to custom endpoint");
        let auth = self.auth(integration)?;
        let url = format!("{}/availability", self.endpoint(integration)?);
        let status = if availability.status == AvailabilityStatus::Available {
            "OPEN"
        } else {
            "CLOSED"
        };
        let body = json!({
            "availability": {
                "date": availability.date.to_string(),
                "room_type_id": availability.roomtype_id,
                "available_rooms": availability.available_rooms,
                "total_rooms": availability.total_rooms,
                "status": status,
            },
        });
        self.http.put(&url, &auth, &body).await?;
        Ok(())
    }

    async fn process_webhook(
        &self,
        _integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        let kind = EventKind::classify_payload(payload);
        match kind {
            EventKind::Unknown => CanonicalEvent::unknown(payload.clone()),
            EventKind::Inventory => {
                let body = inner_object(payload);
                let note = first_str(body, &["room_type_id", "roomTypeId"])
                    .map(|id| format!("inventory update for room type {id}"));
                let event = CanonicalEvent::new(kind, payload.clone());
                match note {
                    Some(note) => event.with_note(note),
                    None => event,
                }
            }
            _ => CanonicalEvent::new(kind, payload.clone()),
        }
    }

    async fn create_reservation(
        &self,
        integration: &ChannelIntegration,
        details: &ReservationDetails,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let url = format!("{}/reservations", self.endpoint(integration)?);
        let body = json!({
            "reservation": {
                "hotel_id": integration.channel_property_id,
                "guest_name": details.guest.as_ref().and_then(|g| g.full_name.as_deref()),
                "check_in": details.stay.check_in.to_string(),
                "check_out": details.stay.check_out.to_string(),
                "room_type_id": details.stay.channel_room_code,
                "total_price": details.total_amount,
                "currency": details.currency.as_deref().unwrap_or("USD"),
            },
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
            self.endpoint(integration)?
        );
        let body = json!({
            "reservation": {
                "id": reservation_id,
                "check_in": details.stay.check_in.to_string(),
                "check_out": details.stay.check_out.to_string(),
                "rooms": details.stay.rooms,
            },
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
            self.endpoint(integration)?
        );
        self.http.delete(&url, &auth).await
    }

    async fn channel_info(
        &self,
        integration: &ChannelIntegration,
    ) -> ChannelResult<JsonValue> {
        let auth = self.auth(integration)?;
        let endpoint = self.endpoint(integration)?;
        let info = self.http.get(&format!("{endpoint}/info"), &auth).await?;
        Ok(json!({
            "channel": self.display_name(),
            "endpoint": endpoint,
            "api_info": info,
        }))
    }
}
