//! Sync log model.
//!
//! Append-only record of sync attempts. A row is created `pending`, moves to
//! `in_progress` when work starts, and settles in a terminal status with its
//! record counters and timing when work ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// What a sync attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    /// Push room inventory details to the channel.
    InventoryUpdate,
    /// Push rate plans to the channel.
    RateUpdate,
    /// Push per-date availability to the channel.
    AvailabilityUpdate,
    /// Apply an inbound reservation.
    BookingCreate,
    /// Apply an inbound reservation change.
    BookingUpdate,
    /// Apply an inbound cancellation.
    BookingCancel,
    /// Change room-type mappings.
    MappingUpdate,
    /// Inventory, rates and availability in one pass.
    FullSync,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOperation::InventoryUpdate => write!(f, "inventory_update"),
            SyncOperation::RateUpdate => write!(f, "rate_update"),
            SyncOperation::AvailabilityUpdate => write!(f, "availability_update"),
            SyncOperation::BookingCreate => write!(f, "booking_create"),
            SyncOperation::BookingUpdate => write!(f, "booking_update"),
            SyncOperation::BookingCancel => write!(f, "booking_cancel"),
            SyncOperation::MappingUpdate => write!(f, "mapping_update"),
            SyncOperation::FullSync => write!(f, "full_sync"),
        }
    }
}

impl std::str::FromStr for SyncOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inventory_update" => Ok(SyncOperation::InventoryUpdate),
            "rate_update" => Ok(SyncOperation::RateUpdate),
            "availability_update" => Ok(SyncOperation::AvailabilityUpdate),
            "booking_create" => Ok(SyncOperation::BookingCreate),
            "booking_update" => Ok(SyncOperation::BookingUpdate),
            "booking_cancel" => Ok(SyncOperation::BookingCancel),
            "mapping_update" => Ok(SyncOperation::MappingUpdate),
            "full_sync" => Ok(SyncOperation::FullSync),
            _ => Err(format!("Unknown sync operation: {s}")),
        }
    }
}

/// Where a sync attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Logged but not started.
    Pending,
    /// Currently running.
    InProgress,
    /// Finished; the attempt as a whole succeeded.
    Success,
    /// Finished; the attempt as a whole failed.
    Failed,
    /// Finished with some records applied and some rejected.
    PartialSuccess,
}

impl SyncStatus {
    /// Whether the attempt has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncStatus::Success | SyncStatus::Failed | SyncStatus::PartialSuccess
        )
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::InProgress => write!(f, "in_progress"),
            SyncStatus::Success => write!(f, "success"),
            SyncStatus::Failed => write!(f, "failed"),
            SyncStatus::PartialSuccess => write!(f, "partial_success"),
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "in_progress" => Ok(SyncStatus::InProgress),
            "success" => Ok(SyncStatus::Success),
            "failed" => Ok(SyncStatus::Failed),
            "partial_success" => Ok(SyncStatus::PartialSuccess),
            _ => Err(format!("Unknown sync status: {s}")),
        }
    }
}

/// Which way the data flowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Hotel system to channel.
    Outbound,
    /// Channel to hotel system.
    Inbound,
    /// Both directions in one attempt.
    Bidirectional,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Outbound => write!(f, "outbound"),
            SyncDirection::Inbound => write!(f, "inbound"),
            SyncDirection::Bidirectional => write!(f, "bidirectional"),
        }
    }
}

impl std::str::FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outbound" => Ok(SyncDirection::Outbound),
            "inbound" => Ok(SyncDirection::Inbound),
            "bidirectional" => Ok(SyncDirection::Bidirectional),
            _ => Err(format!("Unknown sync direction: {s}")),
        }
    }
}

/// Per-record counters accumulated during one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounters {
    /// Records the attempt looked at.
    pub processed: i32,
    /// Records applied successfully.
    pub success: i32,
    /// Records that failed.
    pub failed: i32,
}

impl SyncCounters {
    /// Count one successful record.
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.success += 1;
    }

    /// Count one failed record.
    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    /// Merge counters from a sub-operation.
    pub fn absorb(&mut self, other: SyncCounters) {
        self.processed += other.processed;
        self.success += other.success;
        self.failed += other.failed;
    }
}

/// One sync attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChannelSyncLog {
    /// Unique identifier.
    pub id: Uuid,

    /// Integration the attempt ran for.
    pub integration_id: Uuid,

    /// What the attempt did.
    pub operation: SyncOperation,

    /// Which way the data flowed.
    pub direction: SyncDirection,

    /// Where the attempt stands.
    pub status: SyncStatus,

    /// Snapshot of what was sent or received.
    pub request_data: Option<JsonValue>,

    /// Snapshot of the channel's response.
    pub response_data: Option<JsonValue>,

    /// Error from a failed attempt.
    pub error_message: Option<String>,

    /// Machine-readable error code.
    pub error_code: Option<String>,

    /// Retries consumed so far.
    pub retry_count: i32,

    /// Retries allowed before giving up.
    pub max_retries: i32,

    /// Wall-clock duration of the attempt in milliseconds.
    pub processing_time_ms: Option<i64>,

    /// Records looked at.
    pub records_processed: i32,

    /// Records applied successfully.
    pub records_success: i32,

    /// Records that failed.
    pub records_failed: i32,

    /// Free-form attempt metadata.
    pub metadata: Option<JsonValue>,

    /// When the next retry is due, if one is scheduled.
    pub next_retry_at: Option<DateTime<Utc>>,

    /// When the attempt reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for opening a sync log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSyncLog {
    pub integration_id: Uuid,
    pub operation: SyncOperation,
    pub direction: SyncDirection,
    pub request_data: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub max_retries: Option<i32>,
}

/// Final bookkeeping written when an attempt settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub counters: SyncCounters,
    pub response_data: Option<JsonValue>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub processing_time_ms: i64,
}

impl ChannelSyncLog {
    /// Open a new attempt in `pending` status.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: &CreateSyncLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO channel_sync_logs
                (integration_id, operation, direction, request_data, metadata,
                 max_retries)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 3))
            RETURNING *
            ",
        )
        .bind(input.integration_id)
        .bind(input.operation.to_string())
        .bind(input.direction.to_string())
        .bind(&input.request_data)
        .bind(&input.metadata)
        .bind(input.max_retries)
        .fetch_one(pool)
        .await
    }

    /// Find an attempt by ID.
    pub async fn find_by_id(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_sync_logs
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Mark an attempt as started.
    pub async fn mark_in_progress(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_sync_logs
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Settle an attempt in a terminal status with its final bookkeeping.
    pub async fn complete(
        pool: &sqlx::PgPool,
        id: Uuid,
        outcome: &SyncOutcome,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE channel_sync_logs
            SET status = $2,
                records_processed = $3,
                records_success = $4,
                records_failed = $5,
                response_data = $6,
                error_message = $7,
                error_code = $8,
                processing_time_ms = $9,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(outcome.status.to_string())
        .bind(outcome.counters.processed)
        .bind(outcome.counters.success)
        .bind(outcome.counters.failed)
        .bind(&outcome.response_data)
        .bind(&outcome.error_message)
        .bind(&outcome.error_code)
        .bind(outcome.processing_time_ms)
        .fetch_optional(pool)
        .await
    }

    /// Consume one retry and schedule the next attempt.
    pub async fn schedule_retry(
        pool: &sqlx::PgPool,
        id: Uuid,
        next_retry_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_sync_logs
            SET retry_count = retry_count + 1,
                next_retry_at = $2,
                status = 'pending',
                completed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND retry_count < max_retries
            ",
        )
        .bind(id)
        .bind(next_retry_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List recent attempts for an integration, newest first.
    pub async fn list_by_integration(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_sync_logs
            WHERE integration_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(integration_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// List every attempt for a hotel's integrations since a point in time.
    pub async fn list_for_hotel_since(
        pool: &sqlx::PgPool,
        hotel_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT l.* FROM channel_sync_logs l
            JOIN channel_integrations i ON i.id = l.integration_id
            WHERE i.hotel_id = $1 AND l.created_at >= $2
            ORDER BY l.created_at DESC
            ",
        )
        .bind(hotel_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Check whether the attempt may still be retried.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Check whether the attempt has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_operation_round_trip() {
        for op in [
            SyncOperation::InventoryUpdate,
            SyncOperation::RateUpdate,
            SyncOperation::AvailabilityUpdate,
            SyncOperation::BookingCreate,
            SyncOperation::BookingUpdate,
            SyncOperation::BookingCancel,
            SyncOperation::MappingUpdate,
            SyncOperation::FullSync,
        ] {
            assert_eq!(op.to_string().parse::<SyncOperation>().unwrap(), op);
        }
    }

    #[test]
    fn test_sync_status_terminal() {
        assert!(!SyncStatus::Pending.is_terminal());
        assert!(!SyncStatus::InProgress.is_terminal());
        assert!(SyncStatus::Success.is_terminal());
        assert!(SyncStatus::Failed.is_terminal());
        assert!(SyncStatus::PartialSuccess.is_terminal());
    }

    #[test]
    fn test_sync_direction_display() {
        assert_eq!(SyncDirection::Outbound.to_string(), "outbound");
        assert_eq!(SyncDirection::Inbound.to_string(), "inbound");
        assert_eq!(SyncDirection::Bidirectional.to_string(), "bidirectional");
    }

    #[test]
    fn test_counters_accumulate() {
        let mut counters = SyncCounters::default();
        counters.record_success();
        counters.record_success();
        counters.record_failure();
        assert_eq!(counters.processed, 3);
        assert_eq!(counters.success, 2);
        assert_eq!(counters.failed, 1);
    }

    #[test]
    fn test_counters_absorb() {
        let mut total = SyncCounters {
            processed: 5,
            success: 5,
            failed: 0,
        };
        total.absorb(SyncCounters {
            processed: 3,
            success: 1,
            failed: 2,
        });
        assert_eq!(total.processed, 8);
        assert_eq!(total.success, 6);
        assert_eq!(total.failed, 2);
    }

    fn create_test_log() -> ChannelSyncLog {
        ChannelSyncLog {
            id: Uuid::new_v4(),
            integration_id: Uuid::new_v4(),
            operation: SyncOperation::FullSync,
            direction: SyncDirection::Outbound,
            status: SyncStatus::Pending,
            request_data: None,
            response_data: None,
            error_message: None,
            error_code: None,
            retry_count: 0,
            max_retries: 3,
            processing_time_ms: None,
            records_processed: 0,
            records_success: 0,
            records_failed: 0,
            metadata: None,
            next_retry_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_retry() {
        let log = create_test_log();
        assert!(log.can_retry());

        let exhausted = ChannelSyncLog {
            retry_count: 3,
            ..create_test_log()
        };
        assert!(!exhausted.can_retry());
    }
}
