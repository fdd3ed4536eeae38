//! Integration onboarding and lifecycle management.
//!
//! Registering an integration probes channel connectivity up front,
//! creates the record in pending status, seeds default mapping, rate and
//! availability data, and activates it. Later credential changes re-run
//! the probe, and a parked integration recovers to active through
//! [`OnboardingService::test_integration`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use staylink_channel::registry::{self, AdapterRegistry};
use staylink_channel::types::{ChannelInfo, ConnectionTest};
use staylink_db::models::{
    ChannelIntegration, ChannelType, CreateChannelIntegration, CreateChannelMapping,
    CreateRatePlan, IntegrationStatus, OtaConfiguration, RatePlanType, UpdateChannelIntegration,
    UpsertAvailability,
};

use crate::config::OnboardingConfig;
use crate::error::{SyncError, SyncResult};
use crate::store::SyncStore;

/// Rate plan code written by auto-setup.
const DEFAULT_RATE_PLAN_CODE: &str = "STANDARD";
const DEFAULT_RATE_PLAN_NAME: &str = "Standard Rate";

/// Everything needed to connect a hotel to a channel.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterIntegration {
    pub hotel_id: i64,
    pub channel_type: ChannelType,
    /// Display name; the adapter's name is used when omitted.
    pub channel_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Property identifier on the channel side; generated when omitted.
    pub channel_property_id: Option<String>,
    pub channel_username: Option<String>,
    pub channel_password: Option<String>,
    pub webhook_url: Option<String>,
    pub sync_interval_minutes: Option<i32>,
    pub is_real_time_sync: Option<bool>,
    pub test_mode: Option<bool>,
    pub channel_settings: Option<JsonValue>,
    /// Room type the seed data is created against. Seeding is skipped
    /// when omitted.
    pub default_roomtype_id: Option<i64>,
    /// Rooms per seeded availability row; config default when omitted.
    pub default_total_rooms: Option<i32>,
    pub created_by: Option<i64>,
}

/// Registers integrations and manages their lifecycle.
pub struct OnboardingService {
    store: Arc<dyn SyncStore>,
    registry: Arc<AdapterRegistry>,
    config: OnboardingConfig,
}

impl OnboardingService {
    pub fn new(store: Arc<dyn SyncStore>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            store,
            registry,
            config: OnboardingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OnboardingConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a hotel on a channel.
    ///
    /// A hotel can hold at most one integration per channel type. The
    /// connectivity probe runs before anything is persisted, so a bad
    /// credential set never leaves a half-created record behind. On
    /// success the integration comes back in active status with its seed
    /// data in place; an auto-setup failure parks it in error status.
    #[instrument(skip(self, request), fields(hotel_id = request.hotel_id, channel_type = %request.channel_type))]
    pub async fn register_integration(
        &self,
        request: RegisterIntegration,
    ) -> SyncResult<ChannelIntegration> {
        if self
            .store
            .integration_for_channel(request.hotel_id, request.channel_type)
            .await?
            .is_some()
        {
            return Err(SyncError::duplicate_integration(
                request.hotel_id,
                request.channel_type,
            ));
        }

        let property_id = request
            .channel_property_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_property_id(request.hotel_id, request.channel_type));

        let draft = self.draft_integration(&request, &property_id);
        let test = self.connection_test(&draft).await?;
        if !test.success {
            let message = test
                .error
                .unwrap_or_else(|| "connection test failed".to_string());
            return Err(SyncError::connection_test_failed(
                request.channel_type,
                message,
            ));
        }

        let integration = self
            .store
            .create_integration(&CreateChannelIntegration {
                hotel_id: request.hotel_id,
                channel_type: request.channel_type,
                channel_name: display_name_for(&request),
                api_key: request.api_key.clone(),
                api_secret: request.api_secret.clone(),
                access_token: request.access_token.clone(),
                refresh_token: request.refresh_token.clone(),
                channel_property_id: Some(property_id),
                channel_username: request.channel_username.clone(),
                channel_password: request.channel_password.clone(),
                webhook_url: request.webhook_url.clone(),
                webhook_secret: None,
                is_webhook_enabled: Some(request.webhook_url.is_some()),
                sync_interval_minutes: request.sync_interval_minutes,
                is_real_time_sync: request.is_real_time_sync,
                test_mode: request.test_mode,
                channel_settings: request.channel_settings.clone(),
                created_by: request.created_by,
            })
            .await?;
        info!(integration_id = %integration.id, "integration created, running auto-setup");

        let features = json!(registry::features_of(request.channel_type));
        if let Err(err) = self
            .store
            .update_integration(
                integration.id,
                &UpdateChannelIntegration {
                    supported_features: Some(features),
                    ..UpdateChannelIntegration::default()
                },
            )
            .await
        {
            warn!(error = %err, "could not record supported features");
        }

        match self.auto_setup(&integration, &request).await {
            Ok(()) => {
                self.store
                    .set_integration_status(integration.id, IntegrationStatus::Active, None)
                    .await?;
                info!(integration_id = %integration.id, "integration active");
                self.store
                    .integration(integration.id)
                    .await?
                    .ok_or_else(|| SyncError::integration_not_found(integration.id))
            }
            Err(err) => {
                error!(integration_id = %integration.id, error = %err, "auto-setup failed");
                if let Err(db_err) = self
                    .store
                    .set_integration_status(
                        integration.id,
                        IntegrationStatus::Error,
                        Some(&err.to_string()),
                    )
                    .await
                {
                    error!(error = %db_err, "could not record auto-setup failure");
                }
                Err(err)
            }
        }
    }

    /// Re-run the connectivity test for an existing integration and
    /// persist the outcome: active on success, error on failure. This is
    /// also the recovery path for integrations parked in error status.
    pub async fn test_integration(&self, id: Uuid) -> SyncResult<ConnectionTest> {
        let integration = self
            .store
            .integration(id)
            .await?
            .ok_or_else(|| SyncError::integration_not_found(id))?;

        let test = self.connection_test(&integration).await?;
        if test.success {
            self.store
                .set_integration_status(id, IntegrationStatus::Active, None)
                .await?;
            info!(integration_id = %id, "connection test passed, integration active");
        } else {
            let message = test
                .error
                .clone()
                .unwrap_or_else(|| "connection test failed".to_string());
            self.store
                .set_integration_status(id, IntegrationStatus::Error, Some(&message))
                .await?;
            warn!(integration_id = %id, error = %message, "connection test failed");
        }
        Ok(test)
    }

    /// Apply a partial update. When credential or connection material
    /// changes, the connectivity test reruns and the integration's
    /// status follows the outcome.
    pub async fn update_integration(
        &self,
        id: Uuid,
        update: UpdateChannelIntegration,
    ) -> SyncResult<ChannelIntegration> {
        let existing = self
            .store
            .integration(id)
            .await?
            .ok_or_else(|| SyncError::integration_not_found(id))?;
        let updated = self
            .store
            .update_integration(id, &update)
            .await?
            .ok_or_else(|| SyncError::integration_not_found(id))?;

        if credentials_changed(&existing, &updated) {
            debug!(integration_id = %id, "credentials changed, re-testing connection");
            let test = self.connection_test(&updated).await?;
            if test.success {
                self.store
                    .set_integration_status(id, IntegrationStatus::Active, None)
                    .await?;
            } else {
                let message = test
                    .error
                    .unwrap_or_else(|| "connection test failed".to_string());
                self.store
                    .set_integration_status(id, IntegrationStatus::Error, Some(&message))
                    .await?;
            }
            return self
                .store
                .integration(id)
                .await?
                .ok_or_else(|| SyncError::integration_not_found(id));
        }
        Ok(updated)
    }

    /// Channel types the hotel is not connected to yet, with display
    /// metadata for listing endpoints.
    pub async fn available_channel_types(&self, hotel_id: i64) -> SyncResult<Vec<ChannelInfo>> {
        let connected: HashSet<ChannelType> = self
            .store
            .integrations_for_hotel(hotel_id)
            .await?
            .iter()
            .map(|integration| integration.channel_type)
            .collect();

        Ok(ChannelType::all()
            .into_iter()
            .filter(|channel_type| !connected.contains(channel_type))
            .map(registry::overview)
            .collect())
    }

    /// Probe channel connectivity for an integration, merging in
    /// platform-level credentials where the integration carries none. A
    /// missing or inactive platform configuration fails the probe.
    async fn connection_test(
        &self,
        integration: &ChannelIntegration,
    ) -> SyncResult<ConnectionTest> {
        let Some(ota) = self
            .store
            .ota_configuration(integration.channel_type)
            .await?
        else {
            return Ok(ConnectionTest::failed(
                "channel configuration not found or inactive",
            ));
        };
        let probe = merge_credentials(integration, &ota);
        let adapter = self.registry.resolve(integration.channel_type)?;
        Ok(adapter.test_connection(&probe).await)
    }

    /// Seed a freshly created integration: a default room mapping, one
    /// availability row per day over the seed window, and a standard
    /// rate plan. Skipped entirely when no room type was supplied.
    async fn auto_setup(
        &self,
        integration: &ChannelIntegration,
        request: &RegisterIntegration,
    ) -> SyncResult<()> {
        let Some(roomtype_id) = request.default_roomtype_id else {
            debug!("no default room type supplied, skipping seed data");
            return Ok(());
        };

        self.store
            .create_mapping(&CreateChannelMapping {
                integration_id: integration.id,
                roomtype_id,
                channel_room_type_id: roomtype_id.to_string(),
                channel_room_type_name: Some(format!("Room type {roomtype_id}")),
                channel_rate_plan_id: Some(DEFAULT_RATE_PLAN_CODE.to_string()),
                channel_rate_plan_name: Some(DEFAULT_RATE_PLAN_NAME.to_string()),
                channel_description: None,
                channel_amenities: None,
                channel_images: None,
                mapping_rules: None,
                custom_fields: None,
                created_by: request.created_by,
            })
            .await?;

        let total_rooms = request
            .default_total_rooms
            .unwrap_or(self.config.seed_total_rooms)
            .max(0);
        let start = Utc::now().date_naive();
        for offset in 0..i64::from(self.config.seed_window_days) {
            let date = start + chrono::Duration::days(offset);
            self.store
                .upsert_availability(&UpsertAvailability {
                    integration_id: integration.id,
                    roomtype_id,
                    date,
                    total_rooms,
                    occupied_rooms: 0,
                    blocked_rooms: 0,
                    maintenance_rooms: 0,
                    rate: Some(self.config.seed_base_rate),
                    currency: Some(self.config.seed_currency.clone()),
                    restrictions: None,
                })
                .await?;
        }

        self.store
            .create_rate_plan(&CreateRatePlan {
                integration_id: integration.id,
                roomtype_id,
                channel_rate_plan_id: DEFAULT_RATE_PLAN_CODE.to_string(),
                channel_rate_plan_name: Some(DEFAULT_RATE_PLAN_NAME.to_string()),
                rate_plan_type: RatePlanType::Standard,
                base_rate: self.config.seed_base_rate,
                currency: self.config.seed_currency.clone(),
                min_stay: None,
                max_stay: None,
                rate_modifier: None,
                modifier_type: None,
                cancellation_policy: None,
                created_by: request.created_by,
            })
            .await?;

        info!(
            roomtype_id,
            days = self.config.seed_window_days,
            "seed data created"
        );
        Ok(())
    }

    /// Transient integration used for the pre-creation connectivity
    /// probe. Never persisted.
    fn draft_integration(
        &self,
        request: &RegisterIntegration,
        property_id: &str,
    ) -> ChannelIntegration {
        let now = Utc::now();
        ChannelIntegration {
            id: Uuid::new_v4(),
            hotel_id: request.hotel_id,
            channel_type: request.channel_type,
            channel_name: display_name_for(request),
            status: IntegrationStatus::Testing,
            api_key: request.api_key.clone(),
            api_secret: request.api_secret.clone(),
            access_token: request.access_token.clone(),
            refresh_token: request.refresh_token.clone(),
            channel_property_id: Some(property_id.to_string()),
            channel_username: request.channel_username.clone(),
            channel_password: request.channel_password.clone(),
            webhook_url: request.webhook_url.clone(),
            webhook_secret: None,
            is_webhook_enabled: request.webhook_url.is_some(),
            sync_interval_minutes: request.sync_interval_minutes.unwrap_or(15),
            is_real_time_sync: request.is_real_time_sync.unwrap_or(false),
            last_sync_at: None,
            last_successful_sync: None,
            error_message: None,
            test_mode: request.test_mode.unwrap_or(false),
            channel_settings: request.channel_settings.clone(),
            supported_features: None,
            created_by: request.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn display_name_for(request: &RegisterIntegration) -> String {
    request
        .channel_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| registry::display_name(request.channel_type).to_string())
}

/// Copy of an integration with platform-level fallback credentials
/// filled in. Integration-supplied values win; the platform's base URL
/// lands in the channel settings only when none is set there.
fn merge_credentials(
    integration: &ChannelIntegration,
    ota: &OtaConfiguration,
) -> ChannelIntegration {
    let mut merged = integration.clone();
    if merged.api_key.is_none() {
        merged.api_key = ota.api_key.clone();
    }
    if merged.api_secret.is_none() {
        merged.api_secret = ota.api_secret.clone();
    }
    if merged.access_token.is_none() {
        merged.access_token = ota.access_token.clone();
    }
    if merged.refresh_token.is_none() {
        merged.refresh_token = ota.refresh_token.clone();
    }
    if let Some(base_url) = &ota.base_url {
        let settings = merged.channel_settings.get_or_insert_with(|| json!({}));
        if let Some(object) = settings.as_object_mut() {
            if !object.contains_key("base_url") {
                object.insert("base_url".to_string(), json!(base_url));
            }
        }
    }
    merged
}

/// Whether an update touched anything the connectivity test depends on.
fn credentials_changed(before: &ChannelIntegration, after: &ChannelIntegration) -> bool {
    before.api_key != after.api_key
        || before.api_secret != after.api_secret
        || before.access_token != after.access_token
        || before.refresh_token != after.refresh_token
        || before.channel_property_id != after.channel_property_id
        || before.channel_username != after.channel_username
        || before.channel_password != after.channel_password
        || before.channel_settings != after.channel_settings
}

/// Derive a property identifier for a hotel on a channel:
/// `H<hotel><channel letter><timestamp>`, uppercase, with the current
/// epoch milliseconds rendered in base 36.
fn generate_property_id(hotel_id: i64, channel_type: ChannelType) -> String {
    let stamp = to_base36(Utc::now().timestamp_millis());
    format!("H{hotel_id}{}{stamp}", channel_type.code_letter()).to_uppercase()
}

/// Render a non-negative number in base 36 with digits and lowercase
/// letters. Zero and negatives render as "0".
fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
