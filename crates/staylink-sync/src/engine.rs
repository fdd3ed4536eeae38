//! Core synchronization engine.
//!
//! [`SyncEngine`] owns the outbound sync path: it resolves the adapter for
//! an integration, pushes mappings, rates and availability to the channel,
//! and records the run in the sync log. Inbound webhook handling lives in
//! the `webhook` module as a second impl block on the same type.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use staylink_channel::registry::AdapterRegistry;
use staylink_channel::traits::ChannelAdapter;
use staylink_db::models::{
    ChannelIntegration, ChannelSyncLog, CreateSyncLog, SyncCounters, SyncDirection, SyncOperation,
    SyncOutcome, SyncStatus,
};

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::pms::PmsForwarder;
use crate::statistics::{SyncStatistics, DEFAULT_STATISTICS_WINDOW_DAYS};
use crate::store::SyncStore;

/// Per-integration async locks. Mutating operations against the same
/// integration serialize on these so concurrent webhook application and
/// scheduled pushes never interleave calendar writes.
pub(crate) struct IntegrationLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl IntegrationLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the lock for an integration, creating it on first use.
    pub(crate) async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(id).or_default().clone()
    }
}

/// Drives outbound synchronization and inbound webhook application for
/// all registered integrations.
pub struct SyncEngine {
    pub(crate) store: Arc<dyn SyncStore>,
    pub(crate) registry: Arc<AdapterRegistry>,
    pub(crate) forwarder: Arc<PmsForwarder>,
    pub(crate) config: EngineConfig,
    pub(crate) locks: IntegrationLocks,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn SyncStore>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            store,
            registry,
            forwarder: Arc::new(PmsForwarder::disabled()),
            config: EngineConfig::default(),
            locks: IntegrationLocks::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_forwarder(mut self, forwarder: Arc<PmsForwarder>) -> Self {
        self.forwarder = forwarder;
        self
    }

    /// The storage backend, for callers that need direct queries.
    pub fn store(&self) -> &Arc<dyn SyncStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load an integration by id and sync it, rejecting any that is not
    /// active. Entry point for manually triggered syncs.
    pub async fn trigger_sync_by_id(
        &self,
        integration_id: Uuid,
        operation: SyncOperation,
    ) -> SyncResult<ChannelSyncLog> {
        let integration = self
            .store
            .integration(integration_id)
            .await?
            .ok_or_else(|| SyncError::integration_not_found(integration_id))?;
        if !integration.is_active() {
            return Err(SyncError::not_syncable(integration.id, integration.status));
        }
        self.trigger_sync(&integration, operation).await
    }

    /// Run one outbound sync operation for an integration.
    ///
    /// The run is recorded in the sync log from start to finish. Per-item
    /// failures are absorbed into the log's counters; only escape errors
    /// such as a missing adapter or an operation that cannot be dispatched
    /// fail the log and drop the integration into error status.
    #[instrument(skip(self, integration), fields(integration_id = %integration.id, operation = %operation))]
    pub async fn trigger_sync(
        &self,
        integration: &ChannelIntegration,
        operation: SyncOperation,
    ) -> SyncResult<ChannelSyncLog> {
        let guard = self.locks.lock_for(integration.id).await;
        let _held = guard.lock().await;

        let log = self
            .store
            .create_sync_log(&CreateSyncLog {
                integration_id: integration.id,
                operation,
                direction: SyncDirection::Outbound,
                request_data: None,
                metadata: None,
                max_retries: None,
            })
            .await?;
        self.store.mark_log_in_progress(log.id).await?;

        let started = Instant::now();
        match self.dispatch(integration, operation).await {
            Ok((counters, response_data)) => {
                let outcome = SyncOutcome {
                    status: SyncStatus::Success,
                    counters,
                    response_data,
                    error_message: None,
                    error_code: None,
                    processing_time_ms: started.elapsed().as_millis() as i64,
                };
                let completed = self.store.complete_sync_log(log.id, &outcome).await?;
                self.store.record_sync_success(integration.id).await?;
                info!(
                    processed = counters.processed,
                    success = counters.success,
                    failed = counters.failed,
                    "sync completed"
                );
                Ok(completed.unwrap_or(log))
            }
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "sync failed");
                let outcome = SyncOutcome {
                    status: SyncStatus::Failed,
                    counters: SyncCounters::default(),
                    response_data: None,
                    error_message: Some(err.to_string()),
                    error_code: Some(err.error_code().to_string()),
                    processing_time_ms: started.elapsed().as_millis() as i64,
                };
                if let Err(db_err) = self.store.complete_sync_log(log.id, &outcome).await {
                    error!(error = %db_err, "could not close sync log after failure");
                }
                if let Err(db_err) = self
                    .store
                    .record_sync_failure(integration.id, &err.to_string())
                    .await
                {
                    error!(error = %db_err, "could not record sync failure on integration");
                }
                Err(err)
            }
        }
    }

    /// Recent sync log entries for an integration, newest first.
    pub async fn sync_history(
        &self,
        integration_id: Uuid,
        limit: i64,
    ) -> SyncResult<Vec<ChannelSyncLog>> {
        self.store.logs_for_integration(integration_id, limit).await
    }

    /// Aggregate sync statistics for a hotel over a lookback window.
    pub async fn sync_statistics(
        &self,
        hotel_id: i64,
        window_days: Option<i64>,
    ) -> SyncResult<SyncStatistics> {
        let days = window_days.unwrap_or(DEFAULT_STATISTICS_WINDOW_DAYS).max(1);
        let since = chrono::Utc::now() - chrono::Duration::days(days);
        let logs = self.store.logs_for_hotel_since(hotel_id, since).await?;
        Ok(SyncStatistics::from_logs(&logs))
    }

    async fn dispatch(
        &self,
        integration: &ChannelIntegration,
        operation: SyncOperation,
    ) -> SyncResult<(SyncCounters, Option<JsonValue>)> {
        let adapter = self.registry.resolve(integration.channel_type)?;
        match operation {
            SyncOperation::InventoryUpdate => Ok((
                self.push_inventory(integration, adapter.as_ref()).await?,
                None,
            )),
            SyncOperation::RateUpdate => {
                Ok((self.push_rates(integration, adapter.as_ref()).await?, None))
            }
            SyncOperation::AvailabilityUpdate => Ok((
                self.push_availability(integration, adapter.as_ref()).await?,
                None,
            )),
            SyncOperation::FullSync => {
                let mut total = SyncCounters::default();
                let mut sections = serde_json::Map::new();

                let inventory = self.push_inventory(integration, adapter.as_ref()).await?;
                total.absorb(inventory);
                sections.insert(
                    SyncOperation::InventoryUpdate.to_string(),
                    serde_json::to_value(inventory)?,
                );

                let rates = self.push_rates(integration, adapter.as_ref()).await?;
                total.absorb(rates);
                sections.insert(
                    SyncOperation::RateUpdate.to_string(),
                    serde_json::to_value(rates)?,
                );

                let availability = self.push_availability(integration, adapter.as_ref()).await?;
                total.absorb(availability);
                sections.insert(
                    SyncOperation::AvailabilityUpdate.to_string(),
                    serde_json::to_value(availability)?,
                );

                Ok((total, Some(JsonValue::Object(sections))))
            }
            other => Err(SyncError::unsupported_operation(other.to_string())),
        }
    }

    /// Push every active room mapping to the channel. One failed mapping
    /// counts as one failed record and does not stop the rest.
    async fn push_inventory(
        &self,
        integration: &ChannelIntegration,
        adapter: &dyn ChannelAdapter,
    ) -> SyncResult<SyncCounters> {
        let mappings = self.store.active_mappings(integration.id).await?;
        let mut counters = SyncCounters::default();
        for mapping in &mappings {
            match adapter.update_inventory(integration, mapping).await {
                Ok(()) => counters.record_success(),
                Err(err) => {
                    warn!(
                        mapping_id = %mapping.id,
                        channel_room = %mapping.channel_room_type_id,
                        error = %err,
                        "inventory push failed for mapping"
                    );
                    counters.record_failure();
                }
            }
        }
        debug!(mappings = mappings.len(), "inventory push finished");
        Ok(counters)
    }

    /// Push every active rate plan to the channel, isolating failures the
    /// same way as inventory.
    async fn push_rates(
        &self,
        integration: &ChannelIntegration,
        adapter: &dyn ChannelAdapter,
    ) -> SyncResult<SyncCounters> {
        let plans = self.store.rate_plans(integration.id).await?;
        let mut counters = SyncCounters::default();
        for plan in &plans {
            match adapter.update_rates(integration, plan).await {
                Ok(()) => counters.record_success(),
                Err(err) => {
                    warn!(
                        rate_plan_id = %plan.id,
                        channel_rate_plan = %plan.channel_rate_plan_id,
                        error = %err,
                        "rate push failed for plan"
                    );
                    counters.record_failure();
                }
            }
        }
        debug!(plans = plans.len(), "rate push finished");
        Ok(counters)
    }

    /// Push the availability calendar for every mapped room type over the
    /// configured rolling window. A mapping whose rows cannot be listed
    /// counts as one failed record; individual row failures count per row.
    async fn push_availability(
        &self,
        integration: &ChannelIntegration,
        adapter: &dyn ChannelAdapter,
    ) -> SyncResult<SyncCounters> {
        let from = chrono::Utc::now().date_naive();
        let to = from + chrono::Duration::days(i64::from(self.config.availability_window_days));

        let mappings = self.store.active_mappings(integration.id).await?;
        let mut counters = SyncCounters::default();
        for mapping in &mappings {
            let rows = match self
                .store
                .availability_range(integration.id, mapping.roomtype_id, from, to)
                .await
            {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(
                        roomtype_id = mapping.roomtype_id,
                        error = %err,
                        "could not load availability for mapping"
                    );
                    counters.record_failure();
                    continue;
                }
            };

            for row in &rows {
                match adapter.update_availability(integration, row).await {
                    Ok(()) => {
                        counters.record_success();
                        if let Err(err) = self
                            .store
                            .mark_availability_synced(row.id, SyncStatus::Success, None)
                            .await
                        {
                            warn!(availability_id = %row.id, error = %err, "could not mark availability row synced");
                        }
                    }
                    Err(err) => {
                        warn!(
                            availability_id = %row.id,
                            date = %row.date,
                            error = %err,
                            "availability push failed"
                        );
                        counters.record_failure();
                        if let Err(db_err) = self
                            .store
                            .mark_availability_synced(row.id, SyncStatus::Failed, Some(&err.to_string()))
                            .await
                        {
                            warn!(availability_id = %row.id, error = %db_err, "could not mark availability row failed");
                        }
                    }
                }
            }
        }
        Ok(counters)
    }
}
