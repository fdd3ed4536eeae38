//! Shared in-memory test doubles for the sync engine suites.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use staylink_channel::error::{ChannelError, ChannelResult};
use staylink_channel::events::{
    inner_object, CanonicalEvent, EventKind, ReservationDetails, StaySummary,
};
use staylink_channel::registry::AdapterRegistry;
use staylink_channel::traits::ChannelAdapter;
use staylink_channel::types::{ConnectionTest, CredentialField};
use staylink_db::models::{
    derived_available, derived_status, ChannelAvailability, ChannelIntegration, ChannelMapping,
    ChannelRatePlan, ChannelSyncLog, ChannelType, CreateChannelIntegration, CreateChannelMapping,
    CreateRatePlan, CreateSyncLog, IntegrationStatus, OccupancyUpdate, OtaConfiguration,
    SyncOutcome, SyncStatus, UpdateChannelIntegration, UpsertAvailability,
};
use staylink_sync::error::{SyncError, SyncResult};
use staylink_sync::store::SyncStore;
use staylink_sync::{OnboardingService, SyncEngine};

// ============================================================
// Mock store
// ============================================================

/// In-memory [`SyncStore`] mirroring the Postgres semantics closely
/// enough for engine behavior tests.
#[derive(Default)]
pub struct MockStore {
    pub integrations: Mutex<Vec<ChannelIntegration>>,
    pub mappings: Mutex<Vec<ChannelMapping>>,
    pub rate_plans: Mutex<Vec<ChannelRatePlan>>,
    pub availability: Mutex<Vec<ChannelAvailability>>,
    pub logs: Mutex<Vec<ChannelSyncLog>>,
    pub ota_configs: Mutex<Vec<OtaConfiguration>>,
    pub fail_availability_listing: AtomicBool,
    pub fail_mapping_creation: AtomicBool,
    pub set_occupancy_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_integration(&self, integration: ChannelIntegration) {
        self.integrations.lock().unwrap().push(integration);
    }

    pub fn insert_mapping(&self, mapping: ChannelMapping) {
        self.mappings.lock().unwrap().push(mapping);
    }

    pub fn insert_rate_plan(&self, plan: ChannelRatePlan) {
        self.rate_plans.lock().unwrap().push(plan);
    }

    pub fn insert_availability(&self, row: ChannelAvailability) {
        self.availability.lock().unwrap().push(row);
    }

    pub fn insert_ota_config(&self, config: OtaConfiguration) {
        self.ota_configs.lock().unwrap().push(config);
    }

    /// Occupied room count for a room type on a date, for assertions.
    pub fn occupied_on(&self, integration_id: Uuid, roomtype_id: i64, date: NaiveDate) -> i32 {
        self.availability
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.integration_id == integration_id
                    && row.roomtype_id == roomtype_id
                    && row.date == date
            })
            .map(|row| row.occupied_rooms)
            .expect("availability row should exist")
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    pub fn latest_log(&self) -> ChannelSyncLog {
        self.logs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one sync log should exist")
    }

    pub fn integration_by_id(&self, id: Uuid) -> ChannelIntegration {
        self.integrations
            .lock()
            .unwrap()
            .iter()
            .find(|integration| integration.id == id)
            .cloned()
            .expect("integration should exist")
    }
}

#[async_trait]
impl SyncStore for MockStore {
    async fn integration(&self, id: Uuid) -> SyncResult<Option<ChannelIntegration>> {
        Ok(self
            .integrations
            .lock()
            .unwrap()
            .iter()
            .find(|integration| integration.id == id)
            .cloned())
    }

    async fn integration_for_channel(
        &self,
        hotel_id: i64,
        channel_type: ChannelType,
    ) -> SyncResult<Option<ChannelIntegration>> {
        Ok(self
            .integrations
            .lock()
            .unwrap()
            .iter()
            .find(|integration| {
                integration.hotel_id == hotel_id && integration.channel_type == channel_type
            })
            .cloned())
    }

    async fn integrations_for_hotel(&self, hotel_id: i64) -> SyncResult<Vec<ChannelIntegration>> {
        Ok(self
            .integrations
            .lock()
            .unwrap()
            .iter()
            .filter(|integration| integration.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn integrations_needing_sync(&self) -> SyncResult<Vec<ChannelIntegration>> {
        let now = Utc::now();
        Ok(self
            .integrations
            .lock()
            .unwrap()
            .iter()
            .filter(|integration| integration.needs_sync(now))
            .cloned()
            .collect())
    }

    async fn create_integration(
        &self,
        input: &CreateChannelIntegration,
    ) -> SyncResult<ChannelIntegration> {
        let now = Utc::now();
        let integration = ChannelIntegration {
            id: Uuid::new_v4(),
            hotel_id: input.hotel_id,
            channel_type: input.channel_type,
            channel_name: input.channel_name.clone(),
            status: IntegrationStatus::Pending,
            api_key: input.api_key.clone(),
            api_secret: input.api_secret.clone(),
            access_token: input.access_token.clone(),
            refresh_token: input.refresh_token.clone(),
            channel_property_id: input.channel_property_id.clone(),
            channel_username: input.channel_username.clone(),
            channel_password: input.channel_password.clone(),
            webhook_url: input.webhook_url.clone(),
            webhook_secret: input.webhook_secret.clone(),
            is_webhook_enabled: input.is_webhook_enabled.unwrap_or(false),
            sync_interval_minutes: input.sync_interval_minutes.unwrap_or(15),
            is_real_time_sync: input.is_real_time_sync.unwrap_or(false),
            last_sync_at: None,
            last_successful_sync: None,
            error_message: None,
            test_mode: input.test_mode.unwrap_or(false),
            channel_settings: input.channel_settings.clone(),
            supported_features: None,
            created_by: input.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        self.integrations.lock().unwrap().push(integration.clone());
        Ok(integration)
    }

    async fn update_integration(
        &self,
        id: Uuid,
        update: &UpdateChannelIntegration,
    ) -> SyncResult<Option<ChannelIntegration>> {
        let mut integrations = self.integrations.lock().unwrap();
        let Some(integration) = integrations.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.channel_name {
            integration.channel_name = name.clone();
        }
        if let Some(api_key) = &update.api_key {
            integration.api_key = Some(api_key.clone());
        }
        if let Some(api_secret) = &update.api_secret {
            integration.api_secret = Some(api_secret.clone());
        }
        if let Some(access_token) = &update.access_token {
            integration.access_token = Some(access_token.clone());
        }
        if let Some(refresh_token) = &update.refresh_token {
            integration.refresh_token = Some(refresh_token.clone());
        }
        if let Some(property_id) = &update.channel_property_id {
            integration.channel_property_id = Some(property_id.clone());
        }
        if let Some(username) = &update.channel_username {
            integration.channel_username = Some(username.clone());
        }
        if let Some(password) = &update.channel_password {
            integration.channel_password = Some(password.clone());
        }
        if let Some(webhook_url) = &update.webhook_url {
            integration.webhook_url = Some(webhook_url.clone());
        }
        if let Some(webhook_secret) = &update.webhook_secret {
            integration.webhook_secret = Some(webhook_secret.clone());
        }
        if let Some(enabled) = update.is_webhook_enabled {
            integration.is_webhook_enabled = enabled;
        }
        if let Some(interval) = update.sync_interval_minutes {
            integration.sync_interval_minutes = interval;
        }
        if let Some(real_time) = update.is_real_time_sync {
            integration.is_real_time_sync = real_time;
        }
        if let Some(test_mode) = update.test_mode {
            integration.test_mode = test_mode;
        }
        if let Some(settings) = &update.channel_settings {
            integration.channel_settings = Some(settings.clone());
        }
        if let Some(features) = &update.supported_features {
            integration.supported_features = Some(features.clone());
        }
        integration.updated_by = update.updated_by;
        integration.updated_at = Utc::now();
        Ok(Some(integration.clone()))
    }

    async fn set_integration_status(
        &self,
        id: Uuid,
        status: IntegrationStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool> {
        let mut integrations = self.integrations.lock().unwrap();
        let Some(integration) = integrations.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        integration.status = status;
        integration.error_message = error_message.map(ToString::to_string);
        integration.updated_at = Utc::now();
        Ok(true)
    }

    async fn record_sync_success(&self, id: Uuid) -> SyncResult<bool> {
        let mut integrations = self.integrations.lock().unwrap();
        let Some(integration) = integrations.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        let now = Utc::now();
        integration.last_sync_at = Some(now);
        integration.last_successful_sync = Some(now);
        integration.error_message = None;
        integration.updated_at = now;
        Ok(true)
    }

    async fn record_sync_failure(&self, id: Uuid, message: &str) -> SyncResult<bool> {
        let mut integrations = self.integrations.lock().unwrap();
        let Some(integration) = integrations.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        integration.status = IntegrationStatus::Error;
        integration.error_message = Some(message.to_string());
        integration.updated_at = Utc::now();
        Ok(true)
    }

    async fn active_mappings(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelMapping>> {
        let mut mappings: Vec<ChannelMapping> = self
            .mappings
            .lock()
            .unwrap()
            .iter()
            .filter(|mapping| mapping.integration_id == integration_id && mapping.is_active)
            .cloned()
            .collect();
        mappings.sort_by_key(|mapping| mapping.roomtype_id);
        Ok(mappings)
    }

    async fn mapping_for_channel_room(
        &self,
        integration_id: Uuid,
        channel_room_type_id: &str,
    ) -> SyncResult<Option<ChannelMapping>> {
        Ok(self
            .mappings
            .lock()
            .unwrap()
            .iter()
            .find(|mapping| {
                mapping.integration_id == integration_id
                    && mapping.is_active
                    && mapping.channel_room_type_id == channel_room_type_id
            })
            .cloned())
    }

    async fn create_mapping(&self, input: &CreateChannelMapping) -> SyncResult<ChannelMapping> {
        if self.fail_mapping_creation.load(Ordering::SeqCst) {
            return Err(SyncError::internal("induced mapping creation failure"));
        }
        let now = Utc::now();
        let mapping = ChannelMapping {
            id: Uuid::new_v4(),
            integration_id: input.integration_id,
            roomtype_id: input.roomtype_id,
            channel_room_type_id: input.channel_room_type_id.clone(),
            channel_room_type_name: input.channel_room_type_name.clone(),
            channel_rate_plan_id: input.channel_rate_plan_id.clone(),
            channel_rate_plan_name: input.channel_rate_plan_name.clone(),
            channel_amenities: input.channel_amenities.clone(),
            channel_description: input.channel_description.clone(),
            channel_images: input.channel_images.clone(),
            is_active: true,
            mapping_rules: input.mapping_rules.clone(),
            custom_fields: input.custom_fields.clone(),
            created_by: input.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        self.mappings.lock().unwrap().push(mapping.clone());
        Ok(mapping)
    }

    async fn rate_plans(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelRatePlan>> {
        Ok(self
            .rate_plans
            .lock()
            .unwrap()
            .iter()
            .filter(|plan| plan.integration_id == integration_id && plan.is_active)
            .cloned()
            .collect())
    }

    async fn create_rate_plan(&self, input: &CreateRatePlan) -> SyncResult<ChannelRatePlan> {
        let now = Utc::now();
        let plan = ChannelRatePlan {
            id: Uuid::new_v4(),
            integration_id: input.integration_id,
            roomtype_id: input.roomtype_id,
            channel_rate_plan_id: input.channel_rate_plan_id.clone(),
            channel_rate_plan_name: input.channel_rate_plan_name.clone(),
            rate_plan_type: input.rate_plan_type,
            base_rate: input.base_rate,
            currency: input.currency.clone(),
            min_stay: input.min_stay,
            max_stay: input.max_stay,
            closed_to_arrival: false,
            closed_to_departure: false,
            advance_booking_days: None,
            cancellation_policy: input.cancellation_policy.clone(),
            seasonal_rates: None,
            day_of_week_rates: None,
            special_dates: None,
            rate_modifier: input.rate_modifier,
            modifier_type: input.modifier_type,
            is_active: true,
            restrictions: None,
            inclusions: None,
            exclusions: None,
            created_by: input.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        self.rate_plans.lock().unwrap().push(plan.clone());
        Ok(plan)
    }

    async fn availability_range(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SyncResult<Vec<ChannelAvailability>> {
        if self.fail_availability_listing.load(Ordering::SeqCst) {
            return Err(SyncError::internal("induced availability listing failure"));
        }
        let mut rows: Vec<ChannelAvailability> = self
            .availability
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.integration_id == integration_id
                    && row.roomtype_id == roomtype_id
                    && row.date >= from
                    && row.date < to
            })
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.date);
        Ok(rows)
    }

    async fn availability_for_date(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        date: NaiveDate,
    ) -> SyncResult<Option<ChannelAvailability>> {
        Ok(self
            .availability
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.integration_id == integration_id
                    && row.roomtype_id == roomtype_id
                    && row.date == date
            })
            .cloned())
    }

    async fn upsert_availability(
        &self,
        input: &UpsertAvailability,
    ) -> SyncResult<ChannelAvailability> {
        let available = derived_available(
            input.total_rooms,
            input.occupied_rooms,
            input.blocked_rooms,
            input.maintenance_rooms,
        );
        let status = derived_status(available);
        let now = Utc::now();

        let mut rows = self.availability.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| {
            row.integration_id == input.integration_id
                && row.roomtype_id == input.roomtype_id
                && row.date == input.date
        }) {
            row.total_rooms = input.total_rooms;
            row.occupied_rooms = input.occupied_rooms;
            row.blocked_rooms = input.blocked_rooms;
            row.maintenance_rooms = input.maintenance_rooms;
            row.available_rooms = available;
            row.status = status;
            row.rate = input.rate;
            row.currency = input.currency.clone();
            row.restrictions = input.restrictions.clone();
            row.is_synced = false;
            row.updated_at = now;
            return Ok(row.clone());
        }

        let row = ChannelAvailability {
            id: Uuid::new_v4(),
            integration_id: input.integration_id,
            roomtype_id: input.roomtype_id,
            date: input.date,
            status,
            available_rooms: available,
            total_rooms: input.total_rooms,
            occupied_rooms: input.occupied_rooms,
            blocked_rooms: input.blocked_rooms,
            maintenance_rooms: input.maintenance_rooms,
            rate: input.rate,
            currency: input.currency.clone(),
            is_closed: false,
            close_reason: None,
            restrictions: input.restrictions.clone(),
            channel_data: None,
            is_synced: false,
            last_synced_at: None,
            sync_status: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn set_occupancy(&self, id: Uuid, update: OccupancyUpdate) -> SyncResult<bool> {
        self.set_occupancy_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.availability.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(false);
        };
        row.occupied_rooms = update.occupied_rooms;
        row.available_rooms = update.available_rooms;
        row.status = update.status;
        row.is_synced = false;
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_availability_synced(
        &self,
        id: Uuid,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool> {
        let mut rows = self.availability.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(false);
        };
        row.is_synced = true;
        row.last_synced_at = Some(Utc::now());
        row.sync_status = Some(status);
        row.error_message = error_message.map(ToString::to_string);
        Ok(true)
    }

    async fn create_sync_log(&self, input: &CreateSyncLog) -> SyncResult<ChannelSyncLog> {
        let now = Utc::now();
        let log = ChannelSyncLog {
            id: Uuid::new_v4(),
            integration_id: input.integration_id,
            operation: input.operation,
            direction: input.direction,
            status: SyncStatus::Pending,
            request_data: input.request_data.clone(),
            response_data: None,
            error_message: None,
            error_code: None,
            retry_count: 0,
            max_retries: input.max_retries.unwrap_or(3),
            processing_time_ms: None,
            records_processed: 0,
            records_success: 0,
            records_failed: 0,
            metadata: input.metadata.clone(),
            next_retry_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn mark_log_in_progress(&self, id: Uuid) -> SyncResult<bool> {
        let mut logs = self.logs.lock().unwrap();
        let Some(log) = logs.iter_mut().find(|log| log.id == id) else {
            return Ok(false);
        };
        if log.status != SyncStatus::Pending {
            return Ok(false);
        }
        log.status = SyncStatus::InProgress;
        log.updated_at = Utc::now();
        Ok(true)
    }

    async fn complete_sync_log(
        &self,
        id: Uuid,
        outcome: &SyncOutcome,
    ) -> SyncResult<Option<ChannelSyncLog>> {
        let mut logs = self.logs.lock().unwrap();
        let Some(log) = logs.iter_mut().find(|log| log.id == id) else {
            return Ok(None);
        };
        log.status = outcome.status;
        log.records_processed = outcome.counters.processed;
        log.records_success = outcome.counters.success;
        log.records_failed = outcome.counters.failed;
        log.response_data = outcome.response_data.clone();
        log.error_message = outcome.error_message.clone();
        log.error_code = outcome.error_code.clone();
        log.processing_time_ms = Some(outcome.processing_time_ms);
        log.completed_at = Some(Utc::now());
        log.updated_at = Utc::now();
        Ok(Some(log.clone()))
    }

    async fn logs_for_integration(
        &self,
        integration_id: Uuid,
        limit: i64,
    ) -> SyncResult<Vec<ChannelSyncLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|log| log.integration_id == integration_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn logs_for_hotel_since(
        &self,
        hotel_id: i64,
        since: DateTime<Utc>,
    ) -> SyncResult<Vec<ChannelSyncLog>> {
        let hotel_integrations: Vec<Uuid> = self
            .integrations
            .lock()
            .unwrap()
            .iter()
            .filter(|integration| integration.hotel_id == hotel_id)
            .map(|integration| integration.id)
            .collect();
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                hotel_integrations.contains(&log.integration_id) && log.created_at >= since
            })
            .cloned()
            .collect())
    }

    async fn ota_configuration(
        &self,
        channel_type: ChannelType,
    ) -> SyncResult<Option<OtaConfiguration>> {
        Ok(self
            .ota_configs
            .lock()
            .unwrap()
            .iter()
            .find(|config| config.channel_type == channel_type && config.is_active)
            .cloned())
    }
}

// ============================================================
// Mock adapter
// ============================================================

/// Configurable [`ChannelAdapter`] double with call counters.
pub struct MockAdapter {
    channel_type: ChannelType,
    fail_inventory_for: Mutex<Option<String>>,
    fail_rates: AtomicBool,
    fail_availability_push: AtomicBool,
    fail_connection: AtomicBool,
    require_api_key: AtomicBool,
    canned_event: Mutex<Option<CanonicalEvent>>,
    pub inventory_calls: AtomicUsize,
    pub rate_calls: AtomicUsize,
    pub availability_calls: AtomicUsize,
    pub webhook_calls: AtomicUsize,
    pub test_calls: AtomicUsize,
    pub pushed_dates: Mutex<Vec<(i64, NaiveDate)>>,
}

impl MockAdapter {
    pub fn new(channel_type: ChannelType) -> Self {
        Self {
            channel_type,
            fail_inventory_for: Mutex::new(None),
            fail_rates: AtomicBool::new(false),
            fail_availability_push: AtomicBool::new(false),
            fail_connection: AtomicBool::new(false),
            require_api_key: AtomicBool::new(false),
            canned_event: Mutex::new(None),
            inventory_calls: AtomicUsize::new(0),
            rate_calls: AtomicUsize::new(0),
            availability_calls: AtomicUsize::new(0),
            webhook_calls: AtomicUsize::new(0),
            test_calls: AtomicUsize::new(0),
            pushed_dates: Mutex::new(Vec::new()),
        }
    }

    /// Fail inventory pushes for one channel-side room code.
    pub fn with_failing_inventory_for(self, channel_room_type_id: &str) -> Self {
        *self.fail_inventory_for.lock().unwrap() = Some(channel_room_type_id.to_string());
        self
    }

    pub fn with_failing_rates(self) -> Self {
        self.fail_rates.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_availability_push(self) -> Self {
        self.fail_availability_push.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_connection(self) -> Self {
        self.fail_connection.store(true, Ordering::SeqCst);
        self
    }

    /// Make the connectivity probe demand an API key.
    pub fn with_required_api_key(self) -> Self {
        self.require_api_key.store(true, Ordering::SeqCst);
        self
    }

    /// Fix the canonical event returned for every webhook.
    pub fn with_event(self, event: CanonicalEvent) -> Self {
        *self.canned_event.lock().unwrap() = Some(event);
        self
    }

    pub fn pushed_date_count(&self) -> usize {
        self.pushed_dates.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelAdapter for MockAdapter {
    fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    fn required_credentials(&self) -> &'static [CredentialField] {
        if self.require_api_key.load(Ordering::SeqCst) {
            &[CredentialField::ApiKey]
        } else {
            &[]
        }
    }

    async fn test_connection(&self, integration: &ChannelIntegration) -> ConnectionTest {
        self.test_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connection.load(Ordering::SeqCst) {
            return ConnectionTest::failed("induced connection failure");
        }
        let missing = self.missing_credentials(integration);
        if !missing.is_empty() {
            return ConnectionTest::failed(format!("missing credentials: {missing:?}"));
        }
        ConnectionTest::ok()
    }

    async fn update_inventory(
        &self,
        _integration: &ChannelIntegration,
        mapping: &ChannelMapping,
    ) -> ChannelResult<()> {
        self.inventory_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inventory_for.lock().unwrap().as_deref()
            == Some(mapping.channel_room_type_id.as_str())
        {
            return Err(ChannelError::rejected(422, "induced inventory failure"));
        }
        Ok(())
    }

    async fn update_rates(
        &self,
        _integration: &ChannelIntegration,
        _rate_plan: &ChannelRatePlan,
    ) -> ChannelResult<()> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rates.load(Ordering::SeqCst) {
            return Err(ChannelError::rejected(422, "induced rate failure"));
        }
        Ok(())
    }

    async fn update_availability(
        &self,
        _integration: &ChannelIntegration,
        availability: &ChannelAvailability,
    ) -> ChannelResult<()> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_availability_push.load(Ordering::SeqCst) {
            return Err(ChannelError::rejected(503, "induced availability failure"));
        }
        self.pushed_dates
            .lock()
            .unwrap()
            .push((availability.roomtype_id, availability.date));
        Ok(())
    }

    async fn process_webhook(
        &self,
        _integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> CanonicalEvent {
        self.webhook_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(event) = self.canned_event.lock().unwrap().clone() {
            return event;
        }
        let kind = EventKind::classify_payload(payload);
        let mut event = CanonicalEvent::new(kind, payload.clone());
        if kind.is_booking_event() {
            if let Some(stay) = StaySummary::from_payload(inner_object(payload)) {
                event = event.with_reservation(ReservationDetails::stay_only(stay));
            }
        }
        event
    }
}

// ============================================================
// Fixtures
// ============================================================

pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date literal")
}

/// Active test-mode integration for hotel 42 on the custom channel.
pub fn active_integration() -> ChannelIntegration {
    let now = Utc::now();
    ChannelIntegration {
        id: Uuid::new_v4(),
        hotel_id: 42,
        channel_type: ChannelType::Custom,
        channel_name: "Custom Channel".to_string(),
        status: IntegrationStatus::Active,
        api_key: Some("test-key".to_string()),
        api_secret: None,
        access_token: None,
        refresh_token: None,
        channel_property_id: Some("H42C1".to_string()),
        channel_username: None,
        channel_password: None,
        webhook_url: None,
        webhook_secret: None,
        is_webhook_enabled: true,
        sync_interval_minutes: 15,
        is_real_time_sync: false,
        last_sync_at: None,
        last_successful_sync: None,
        error_message: None,
        test_mode: true,
        channel_settings: None,
        supported_features: None,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn mapping_row(
    integration_id: Uuid,
    roomtype_id: i64,
    channel_room_type_id: &str,
) -> ChannelMapping {
    let now = Utc::now();
    ChannelMapping {
        id: Uuid::new_v4(),
        integration_id,
        roomtype_id,
        channel_room_type_id: channel_room_type_id.to_string(),
        channel_room_type_name: Some(format!("Room {roomtype_id}")),
        channel_rate_plan_id: None,
        channel_rate_plan_name: None,
        channel_amenities: None,
        channel_description: None,
        channel_images: None,
        is_active: true,
        mapping_rules: None,
        custom_fields: None,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn rate_plan_row(
    integration_id: Uuid,
    roomtype_id: i64,
    channel_rate_plan_id: &str,
) -> ChannelRatePlan {
    let now = Utc::now();
    ChannelRatePlan {
        id: Uuid::new_v4(),
        integration_id,
        roomtype_id,
        channel_rate_plan_id: channel_rate_plan_id.to_string(),
        channel_rate_plan_name: Some("Standard Rate".to_string()),
        rate_plan_type: staylink_db::models::RatePlanType::Standard,
        base_rate: rust_decimal::Decimal::new(120, 0),
        currency: "USD".to_string(),
        min_stay: None,
        max_stay: None,
        closed_to_arrival: false,
        closed_to_departure: false,
        advance_booking_days: None,
        cancellation_policy: None,
        seasonal_rates: None,
        day_of_week_rates: None,
        special_dates: None,
        rate_modifier: None,
        modifier_type: None,
        is_active: true,
        restrictions: None,
        inclusions: None,
        exclusions: None,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn availability_row(
    integration_id: Uuid,
    roomtype_id: i64,
    day: NaiveDate,
    total_rooms: i32,
    occupied_rooms: i32,
) -> ChannelAvailability {
    let available = derived_available(total_rooms, occupied_rooms, 0, 0);
    let now = Utc::now();
    ChannelAvailability {
        id: Uuid::new_v4(),
        integration_id,
        roomtype_id,
        date: day,
        status: derived_status(available),
        available_rooms: available,
        total_rooms,
        occupied_rooms,
        blocked_rooms: 0,
        maintenance_rooms: 0,
        rate: Some(rust_decimal::Decimal::new(120, 0)),
        currency: Some("USD".to_string()),
        is_closed: false,
        close_reason: None,
        restrictions: None,
        channel_data: None,
        is_synced: false,
        last_synced_at: None,
        sync_status: None,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn active_ota_config(channel_type: ChannelType) -> OtaConfiguration {
    let now = Utc::now();
    OtaConfiguration {
        id: Uuid::new_v4(),
        channel_type,
        api_key: Some("platform-key".to_string()),
        api_secret: Some("platform-secret".to_string()),
        access_token: None,
        refresh_token: None,
        base_url: Some("https://api.example.com".to_string()),
        is_active: true,
        last_tested: None,
        test_status: None,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

/// Engine wired to the given store and a single registered adapter.
pub fn engine_with(store: Arc<MockStore>, adapter: Arc<MockAdapter>) -> SyncEngine {
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    SyncEngine::new(store, Arc::new(registry))
}

/// Onboarding service wired the same way.
pub fn onboarding_with(store: Arc<MockStore>, adapter: Arc<MockAdapter>) -> OnboardingService {
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    OnboardingService::new(store, Arc::new(registry))
}
