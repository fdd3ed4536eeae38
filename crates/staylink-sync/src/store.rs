//! Persistence seam between the sync engine and the database.
//!
//! The engine talks to a [`SyncStore`] trait object so tests can swap in an
//! in-memory store. [`PgSyncStore`] is the production implementation and
//! delegates straight to the model queries in `staylink-db`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use staylink_db::models::{
    ChannelAvailability, ChannelIntegration, ChannelMapping, ChannelRatePlan, ChannelSyncLog,
    ChannelType, CreateChannelIntegration, CreateChannelMapping, CreateRatePlan, CreateSyncLog,
    IntegrationStatus, OccupancyUpdate, OtaConfiguration, SyncOutcome, SyncStatus,
    UpdateChannelIntegration, UpsertAvailability,
};

use crate::error::SyncResult;

/// Storage operations the sync engine depends on.
#[async_trait]
pub trait SyncStore: Send + Sync {
    // --- integrations ---

    /// Load an integration by id.
    async fn integration(&self, id: Uuid) -> SyncResult<Option<ChannelIntegration>>;

    /// Load the integration a hotel has for a channel type, if any.
    async fn integration_for_channel(
        &self,
        hotel_id: i64,
        channel_type: ChannelType,
    ) -> SyncResult<Option<ChannelIntegration>>;

    /// All integrations registered for a hotel, newest first.
    async fn integrations_for_hotel(&self, hotel_id: i64) -> SyncResult<Vec<ChannelIntegration>>;

    /// Active integrations whose last sync is older than their interval.
    async fn integrations_needing_sync(&self) -> SyncResult<Vec<ChannelIntegration>>;

    async fn create_integration(
        &self,
        input: &CreateChannelIntegration,
    ) -> SyncResult<ChannelIntegration>;

    async fn update_integration(
        &self,
        id: Uuid,
        update: &UpdateChannelIntegration,
    ) -> SyncResult<Option<ChannelIntegration>>;

    async fn set_integration_status(
        &self,
        id: Uuid,
        status: IntegrationStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool>;

    /// Stamp a successful sync and clear any stored error.
    async fn record_sync_success(&self, id: Uuid) -> SyncResult<bool>;

    /// Drop the integration to error status with the failure message.
    async fn record_sync_failure(&self, id: Uuid, message: &str) -> SyncResult<bool>;

    // --- room mappings ---

    /// Active room type mappings for an integration.
    async fn active_mappings(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelMapping>>;

    /// Resolve a channel-side room type id to its mapping.
    async fn mapping_for_channel_room(
        &self,
        integration_id: Uuid,
        channel_room_type_id: &str,
    ) -> SyncResult<Option<ChannelMapping>>;

    async fn create_mapping(&self, input: &CreateChannelMapping) -> SyncResult<ChannelMapping>;

    // --- rate plans ---

    /// Active rate plans for an integration.
    async fn rate_plans(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelRatePlan>>;

    async fn create_rate_plan(&self, input: &CreateRatePlan) -> SyncResult<ChannelRatePlan>;

    // --- availability ---

    /// Availability rows for a room type in `[from, to)`, date ascending.
    async fn availability_range(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SyncResult<Vec<ChannelAvailability>>;

    async fn availability_for_date(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        date: NaiveDate,
    ) -> SyncResult<Option<ChannelAvailability>>;

    async fn upsert_availability(
        &self,
        input: &UpsertAvailability,
    ) -> SyncResult<ChannelAvailability>;

    /// Overwrite the occupancy-derived columns of one availability row.
    async fn set_occupancy(&self, id: Uuid, update: OccupancyUpdate) -> SyncResult<bool>;

    async fn mark_availability_synced(
        &self,
        id: Uuid,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool>;

    // --- sync logs ---

    async fn create_sync_log(&self, input: &CreateSyncLog) -> SyncResult<ChannelSyncLog>;

    async fn mark_log_in_progress(&self, id: Uuid) -> SyncResult<bool>;

    async fn complete_sync_log(
        &self,
        id: Uuid,
        outcome: &SyncOutcome,
    ) -> SyncResult<Option<ChannelSyncLog>>;

    async fn logs_for_integration(
        &self,
        integration_id: Uuid,
        limit: i64,
    ) -> SyncResult<Vec<ChannelSyncLog>>;

    async fn logs_for_hotel_since(
        &self,
        hotel_id: i64,
        since: DateTime<Utc>,
    ) -> SyncResult<Vec<ChannelSyncLog>>;

    // --- platform channel configuration ---

    /// Active platform-level credentials for a channel type.
    async fn ota_configuration(
        &self,
        channel_type: ChannelType,
    ) -> SyncResult<Option<OtaConfiguration>>;
}

/// Postgres-backed [`SyncStore`].
#[derive(Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool, for callers that need raw queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn integration(&self, id: Uuid) -> SyncResult<Option<ChannelIntegration>> {
        Ok(ChannelIntegration::find_by_id(&self.pool, id).await?)
    }

    async fn integration_for_channel(
        &self,
        hotel_id: i64,
        channel_type: ChannelType,
    ) -> SyncResult<Option<ChannelIntegration>> {
        Ok(ChannelIntegration::find_by_hotel_and_type(&self.pool, hotel_id, channel_type).await?)
    }

    async fn integrations_for_hotel(&self, hotel_id: i64) -> SyncResult<Vec<ChannelIntegration>> {
        Ok(ChannelIntegration::find_by_hotel(&self.pool, hotel_id).await?)
    }

    async fn integrations_needing_sync(&self) -> SyncResult<Vec<ChannelIntegration>> {
        Ok(ChannelIntegration::find_needing_sync(&self.pool).await?)
    }

    async fn create_integration(
        &self,
        input: &CreateChannelIntegration,
    ) -> SyncResult<ChannelIntegration> {
        Ok(ChannelIntegration::create(&self.pool, input).await?)
    }

    async fn update_integration(
        &self,
        id: Uuid,
        update: &UpdateChannelIntegration,
    ) -> SyncResult<Option<ChannelIntegration>> {
        Ok(ChannelIntegration::update(&self.pool, id, update).await?)
    }

    async fn set_integration_status(
        &self,
        id: Uuid,
        status: IntegrationStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool> {
        Ok(ChannelIntegration::set_status(&self.pool, id, status, error_message).await?)
    }

    async fn record_sync_success(&self, id: Uuid) -> SyncResult<bool> {
        Ok(ChannelIntegration::record_sync_success(&self.pool, id).await?)
    }

    async fn record_sync_failure(&self, id: Uuid, message: &str) -> SyncResult<bool> {
        Ok(ChannelIntegration::record_sync_failure(&self.pool, id, message).await?)
    }

    async fn active_mappings(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelMapping>> {
        Ok(ChannelMapping::list_by_integration(&self.pool, integration_id, true).await?)
    }

    async fn mapping_for_channel_room(
        &self,
        integration_id: Uuid,
        channel_room_type_id: &str,
    ) -> SyncResult<Option<ChannelMapping>> {
        Ok(
            ChannelMapping::find_by_channel_room(&self.pool, integration_id, channel_room_type_id)
                .await?,
        )
    }

    async fn create_mapping(&self, input: &CreateChannelMapping) -> SyncResult<ChannelMapping> {
        Ok(ChannelMapping::create(&self.pool, input).await?)
    }

    async fn rate_plans(&self, integration_id: Uuid) -> SyncResult<Vec<ChannelRatePlan>> {
        Ok(ChannelRatePlan::list_by_integration(&self.pool, integration_id).await?)
    }

    async fn create_rate_plan(&self, input: &CreateRatePlan) -> SyncResult<ChannelRatePlan> {
        Ok(ChannelRatePlan::create(&self.pool, input).await?)
    }

    async fn availability_range(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SyncResult<Vec<ChannelAvailability>> {
        Ok(ChannelAvailability::list_range(&self.pool, integration_id, roomtype_id, from, to)
            .await?)
    }

    async fn availability_for_date(
        &self,
        integration_id: Uuid,
        roomtype_id: i64,
        date: NaiveDate,
    ) -> SyncResult<Option<ChannelAvailability>> {
        Ok(ChannelAvailability::find_for_date(&self.pool, integration_id, roomtype_id, date)
            .await?)
    }

    async fn upsert_availability(
        &self,
        input: &UpsertAvailability,
    ) -> SyncResult<ChannelAvailability> {
        Ok(ChannelAvailability::upsert(&self.pool, input).await?)
    }

    async fn set_occupancy(&self, id: Uuid, update: OccupancyUpdate) -> SyncResult<bool> {
        Ok(ChannelAvailability::set_occupancy(&self.pool, id, update).await?)
    }

    async fn mark_availability_synced(
        &self,
        id: Uuid,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> SyncResult<bool> {
        Ok(ChannelAvailability::mark_synced(&self.pool, id, status, error_message).await?)
    }

    async fn create_sync_log(&self, input: &CreateSyncLog) -> SyncResult<ChannelSyncLog> {
        Ok(ChannelSyncLog::create(&self.pool, input).await?)
    }

    async fn mark_log_in_progress(&self, id: Uuid) -> SyncResult<bool> {
        Ok(ChannelSyncLog::mark_in_progress(&self.pool, id).await?)
    }

    async fn complete_sync_log(
        &self,
        id: Uuid,
        outcome: &SyncOutcome,
    ) -> SyncResult<Option<ChannelSyncLog>> {
        Ok(ChannelSyncLog::complete(&self.pool, id, outcome).await?)
    }

    async fn logs_for_integration(
        &self,
        integration_id: Uuid,
        limit: i64,
    ) -> SyncResult<Vec<ChannelSyncLog>> {
        Ok(ChannelSyncLog::list_by_integration(&self.pool, integration_id, limit).await?)
    }

    async fn logs_for_hotel_since(
        &self,
        hotel_id: i64,
        since: DateTime<Utc>,
    ) -> SyncResult<Vec<ChannelSyncLog>> {
        Ok(ChannelSyncLog::list_for_hotel_since(&self.pool, hotel_id, since).await?)
    }

    async fn ota_configuration(
        &self,
        channel_type: ChannelType,
    ) -> SyncResult<Option<OtaConfiguration>> {
        Ok(OtaConfiguration::find_active_by_type(&self.pool, channel_type).await?)
    }
}
