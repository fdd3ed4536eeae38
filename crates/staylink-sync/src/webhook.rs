//! Inbound webhook processing.
//!
//! Second impl block on [`SyncEngine`]: canonicalizes a raw channel
//! payload through the integration's adapter, applies the booking's
//! occupancy effect to the availability calendar, optionally pushes the
//! changed rows straight back to the channel, and hands the guest record
//! to the PMS forwarder.

use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use staylink_channel::events::{CanonicalEvent, EventKind};
use staylink_db::models::{
    ChannelAvailability, ChannelIntegration, ChannelSyncLog, CreateSyncLog, SyncCounters,
    SyncDirection, SyncOperation, SyncOutcome, SyncStatus,
};

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::occupancy::{plan_adjustments, stay_nights};
use crate::pms::GuestForward;

/// Closest sync-log operation for a classified inbound payload.
fn log_operation(kind: EventKind) -> SyncOperation {
    match kind {
        EventKind::Cancellation => SyncOperation::BookingCancel,
        EventKind::Modification => SyncOperation::BookingUpdate,
        EventKind::Inventory => SyncOperation::InventoryUpdate,
        _ => SyncOperation::BookingCreate,
    }
}

impl SyncEngine {
    /// Handle one inbound webhook delivery for an integration.
    ///
    /// The delivery is always recorded in the sync log with the raw
    /// payload as its request snapshot. Unmapped room references and
    /// dates without calendar rows are skipped without failing the
    /// delivery; adapter resolution, database and serialization errors
    /// close the log as failed and propagate.
    #[instrument(skip(self, integration, payload), fields(integration_id = %integration.id))]
    pub async fn handle_webhook(
        &self,
        integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> SyncResult<ChannelSyncLog> {
        let guard = self.locks.lock_for(integration.id).await;
        let _held = guard.lock().await;

        let log = self
            .store
            .create_sync_log(&CreateSyncLog {
                integration_id: integration.id,
                operation: log_operation(EventKind::classify_payload(payload)),
                direction: SyncDirection::Inbound,
                request_data: Some(payload.clone()),
                metadata: None,
                max_retries: None,
            })
            .await?;
        self.store.mark_log_in_progress(log.id).await?;

        let started = Instant::now();
        match self.apply_webhook(integration, payload).await {
            Ok((event, counters)) => {
                let outcome = SyncOutcome {
                    status: SyncStatus::Success,
                    counters,
                    response_data: serde_json::to_value(&event).ok(),
                    error_message: None,
                    error_code: None,
                    processing_time_ms: started.elapsed().as_millis() as i64,
                };
                let completed = self.store.complete_sync_log(log.id, &outcome).await?;
                info!(
                    kind = %event.kind,
                    nights_seen = counters.processed,
                    nights_updated = counters.success,
                    "webhook processed"
                );
                Ok(completed.unwrap_or(log))
            }
            Err(err) => {
                warn!(error = %err, "webhook processing failed");
                let code = match &err {
                    SyncError::Channel(channel_err) => channel_err.error_code(),
                    _ => "WEBHOOK_ERROR",
                };
                let outcome = SyncOutcome {
                    status: SyncStatus::Failed,
                    counters: SyncCounters::default(),
                    response_data: None,
                    error_message: Some(err.to_string()),
                    error_code: Some(code.to_string()),
                    processing_time_ms: started.elapsed().as_millis() as i64,
                };
                if let Err(db_err) = self.store.complete_sync_log(log.id, &outcome).await {
                    error!(error = %db_err, "could not close webhook log after failure");
                }
                Err(err)
            }
        }
    }

    /// Canonicalize the payload and apply its occupancy effect. Returns
    /// the canonical event plus counters over the stay nights touched.
    async fn apply_webhook(
        &self,
        integration: &ChannelIntegration,
        payload: &JsonValue,
    ) -> SyncResult<(CanonicalEvent, SyncCounters)> {
        let adapter = self.registry.resolve(integration.channel_type)?;
        let event = adapter.process_webhook(integration, payload).await;
        debug!(kind = %event.kind, "webhook canonicalized");

        let mut counters = SyncCounters::default();
        let mut updated_rows: Vec<ChannelAvailability> = Vec::new();

        for adjustment in plan_adjustments(&event) {
            let stay = &adjustment.stay;
            if !stay.has_valid_range() {
                debug!(
                    room = %stay.channel_room_code,
                    check_in = %stay.check_in,
                    check_out = %stay.check_out,
                    "ignoring stay with invalid date range"
                );
                continue;
            }

            let Some(roomtype_id) = self
                .resolve_roomtype(integration.id, &stay.channel_room_code)
                .await?
            else {
                warn!(
                    room = %stay.channel_room_code,
                    "unmapped room reference in webhook, skipping availability update"
                );
                continue;
            };

            for date in stay_nights(stay.check_in, stay.check_out) {
                counters.processed += 1;
                match self
                    .store
                    .availability_for_date(integration.id, roomtype_id, date)
                    .await?
                {
                    Some(row) => {
                        let update = row.apply_occupancy_delta(adjustment.rooms);
                        let mut patched = row;
                        patched.occupied_rooms = update.occupied_rooms;
                        patched.available_rooms = update.available_rooms;
                        patched.status = update.status;
                        self.store.set_occupancy(patched.id, update).await?;
                        counters.success += 1;
                        updated_rows.push(patched);
                    }
                    None => {
                        debug!(roomtype_id, %date, "no availability row for date, skipping");
                    }
                }
            }
        }

        if integration.is_real_time_sync && !updated_rows.is_empty() {
            self.push_back(integration, adapter.as_ref(), &updated_rows)
                .await;
        }

        if let Some(details) = &event.reservation {
            if let Some(guest) = &details.guest {
                let roomtype_id = self
                    .resolve_roomtype(integration.id, &details.stay.channel_room_code)
                    .await
                    .ok()
                    .flatten();
                self.forwarder.enqueue(GuestForward {
                    hotel_id: integration.hotel_id,
                    roomtype_id,
                    guest: guest.clone(),
                });
            }
        }

        Ok((event, counters))
    }

    /// Best-effort push of freshly updated rows back to the channel for
    /// real-time integrations. Never fails the webhook.
    async fn push_back(
        &self,
        integration: &ChannelIntegration,
        adapter: &dyn staylink_channel::traits::ChannelAdapter,
        rows: &[ChannelAvailability],
    ) {
        for row in rows {
            if let Err(err) = adapter.update_availability(integration, row).await {
                warn!(
                    availability_id = %row.id,
                    date = %row.date,
                    error = %err,
                    "real-time availability push failed"
                );
            }
        }
    }

    /// Resolve a channel-side room reference to an internal room type id:
    /// the integration's mapping table first, then a bare numeric id.
    async fn resolve_roomtype(
        &self,
        integration_id: Uuid,
        channel_room_code: &str,
    ) -> SyncResult<Option<i64>> {
        if let Some(mapping) = self
            .store
            .mapping_for_channel_room(integration_id, channel_room_code)
            .await?
        {
            return Ok(Some(mapping.roomtype_id));
        }
        Ok(channel_room_code.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_operation_follows_event_kind() {
        assert_eq!(
            log_operation(EventKind::Reservation),
            SyncOperation::BookingCreate
        );
        assert_eq!(
            log_operation(EventKind::Cancellation),
            SyncOperation::BookingCancel
        );
        assert_eq!(
            log_operation(EventKind::Modification),
            SyncOperation::BookingUpdate
        );
        assert_eq!(
            log_operation(EventKind::Inventory),
            SyncOperation::InventoryUpdate
        );
        assert_eq!(
            log_operation(EventKind::Unknown),
            SyncOperation::BookingCreate
        );
    }
}
