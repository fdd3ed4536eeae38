//! Per-date availability model.
//!
//! One row per (integration, room type, date) holding the room counts the
//! channel sees for that night. Occupancy arithmetic lives here as pure
//! functions so reservation processing and tests share one definition.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use super::sync_log::SyncStatus;

/// Sellable state of a room type on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Rooms are open for sale.
    Available,
    /// Closed for sale by an operator.
    Unavailable,
    /// No sellable rooms remain.
    Occupied,
    /// Out of order for maintenance.
    Maintenance,
    /// Held back from sale.
    Blocked,
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityStatus::Available => write!(f, "available"),
            AvailabilityStatus::Unavailable => write!(f, "unavailable"),
            AvailabilityStatus::Occupied => write!(f, "occupied"),
            AvailabilityStatus::Maintenance => write!(f, "maintenance"),
            AvailabilityStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(AvailabilityStatus::Available),
            "unavailable" => Ok(AvailabilityStatus::Unavailable),
            "occupied" => Ok(AvailabilityStatus::Occupied),
            "maintenance" => Ok(AvailabilityStatus::Maintenance),
            "blocked" => Ok(AvailabilityStatus::Blocked),
            _ => Err(format!("Unknown availability status: {s}")),
        }
    }
}

/// Recomputed occupancy figures for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyUpdate {
    pub occupied_rooms: i32,
    pub available_rooms: i32,
    pub status: AvailabilityStatus,
}

/// Availability of one room type on one date, as seen by one channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChannelAvailability {
    /// Unique identifier.
    pub id: Uuid,

    /// Integration this row belongs to.
    pub integration_id: Uuid,

    /// Internal room type identifier.
    pub roomtype_id: i64,

    /// The stay date this row covers.
    pub date: NaiveDate,

    /// Sellable state.
    pub status: AvailabilityStatus,

    /// Rooms currently open for sale.
    pub available_rooms: i32,

    /// Physical rooms of this type.
    pub total_rooms: i32,

    /// Rooms taken by reservations.
    pub occupied_rooms: i32,

    /// Rooms held back from sale.
    pub blocked_rooms: i32,

    /// Rooms out of order.
    pub maintenance_rooms: i32,

    /// Nightly rate pushed to the channel.
    pub rate: Option<Decimal>,

    /// Currency of the rate.
    pub currency: Option<String>,

    /// Whether the date is closed for sale regardless of counts.
    pub is_closed: bool,

    /// Operator note explaining a closure.
    pub close_reason: Option<String>,

    /// Stay restrictions (min/max stay, CTA/CTD) as JSON.
    pub restrictions: Option<JsonValue>,

    /// Raw channel-side payload from the last sync.
    pub channel_data: Option<JsonValue>,

    /// Whether the channel has acknowledged this row.
    pub is_synced: bool,

    /// When the row was last pushed to the channel.
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Outcome of the last push.
    pub sync_status: Option<SyncStatus>,

    /// Error from the last failed push.
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing one availability row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAvailability {
    pub integration_id: Uuid,
    pub roomtype_id: i64,
    pub date: NaiveDate,
    pub total_rooms: i32,
    pub occupied_rooms: i32,
    pub blocked_rooms: i32,
    pub maintenance_rooms: i32,
    pub rate: Option<Decimal>,
    pub currency: Option<String>,
    pub restrictions: Option<JsonValue>,
}

/// Rooms open for sale after subtracting every committed room.
///
/// Never negative.
#[must_use]
pub fn derived_available(total: i32, occupied: i32, blocked: i32, maintenance: i32) -> i32 {
    (total - occupied - blocked - maintenance).max(0)
}

/// Status implied by the available-room count.
#[must_use]
pub fn derived_status(available: i32) -> AvailabilityStatus {
    if available > 0 {
        AvailabilityStatus::Available
    } else {
        AvailabilityStatus::Occupied
    }
}

impl ChannelAvailability {
    /// Find the row for one (integration, room type, date).
    pub async fn find_for_date(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        roomtype_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_availability
            WHERE integration_id = $1 AND roomtype_id = $2 AND date = $3
            ",
        )
        .bind(integration_id)
        .bind(roomtype_id)
        .bind(date)
        .fetch_optional(pool)
        .await
    }

    /// List rows for a date range, end-exclusive.
    pub async fn list_range(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        roomtype_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_availability
            WHERE integration_id = $1
                AND roomtype_id = $2
                AND date >= $3 AND date < $4
            ORDER BY date ASC
            ",
        )
        .bind(integration_id)
        .bind(roomtype_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// List every unsynced row for an integration.
    pub async fn list_unsynced(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_availability
            WHERE integration_id = $1 AND is_synced = FALSE
            ORDER BY date ASC
            ",
        )
        .bind(integration_id)
        .fetch_all(pool)
        .await
    }

    /// Insert or replace the row for one date. Derived fields are computed
    /// from the supplied counts.
    pub async fn upsert(
        pool: &sqlx::PgPool,
        input: &UpsertAvailability,
    ) -> Result<Self, sqlx::Error> {
        let available = derived_available(
            input.total_rooms,
            input.occupied_rooms,
            input.blocked_rooms,
            input.maintenance_rooms,
        );
        let status = derived_status(available);

        sqlx::query_as(
            r"
            INSERT INTO channel_availability
                (integration_id, roomtype_id, date, status, available_rooms,
                 total_rooms, occupied_rooms, blocked_rooms, maintenance_rooms,
                 rate, currency, restrictions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (integration_id, roomtype_id, date) DO UPDATE
            SET status = EXCLUDED.status,
                available_rooms = EXCLUDED.available_rooms,
                total_rooms = EXCLUDED.total_rooms,
                occupied_rooms = EXCLUDED.occupied_rooms,
                blocked_rooms = EXCLUDED.blocked_rooms,
                maintenance_rooms = EXCLUDED.maintenance_rooms,
                rate = EXCLUDED.rate,
                currency = EXCLUDED.currency,
                restrictions = EXCLUDED.restrictions,
                is_synced = FALSE,
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(input.integration_id)
        .bind(input.roomtype_id)
        .bind(input.date)
        .bind(status.to_string())
        .bind(available)
        .bind(input.total_rooms)
        .bind(input.occupied_rooms)
        .bind(input.blocked_rooms)
        .bind(input.maintenance_rooms)
        .bind(input.rate)
        .bind(&input.currency)
        .bind(&input.restrictions)
        .fetch_one(pool)
        .await
    }

    /// Write recomputed occupancy figures for one row.
    pub async fn set_occupancy(
        pool: &sqlx::PgPool,
        id: Uuid,
        update: OccupancyUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_availability
            SET occupied_rooms = $2,
                available_rooms = $3,
                status = $4,
                is_synced = FALSE,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.occupied_rooms)
        .bind(update.available_rooms)
        .bind(update.status.to_string())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a row as acknowledged by the channel.
    pub async fn mark_synced(
        pool: &sqlx::PgPool,
        id: Uuid,
        sync_status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_availability
            SET is_synced = TRUE,
                last_synced_at = NOW(),
                sync_status = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(sync_status.to_string())
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Occupancy figures after taking or releasing rooms.
    ///
    /// A positive `rooms` takes rooms (a new reservation), a negative one
    /// releases them (a cancellation). Occupancy is clamped to
    /// `[0, total_rooms]`; availability and status are rederived from the
    /// clamped count.
    #[must_use]
    pub fn apply_occupancy_delta(&self, rooms: i32) -> OccupancyUpdate {
        let occupied = (self.occupied_rooms + rooms).clamp(0, self.total_rooms);
        let available = derived_available(
            self.total_rooms,
            occupied,
            self.blocked_rooms,
            self.maintenance_rooms,
        );
        OccupancyUpdate {
            occupied_rooms: occupied,
            available_rooms: available,
            status: derived_status(available),
        }
    }

    /// Check whether the date can take `rooms` more reservations.
    #[must_use]
    pub fn can_accommodate(&self, rooms: i32) -> bool {
        !self.is_closed && self.available_rooms >= rooms
    }
}
