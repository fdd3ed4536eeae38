//! Channel integration model.
//!
//! One row per (hotel, distribution channel) connection, carrying the
//! credentials, sync cadence and lifecycle status for that channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Distribution channel a hotel can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Booking.com.
    BookingCom,
    /// Expedia group.
    Expedia,
    /// Airbnb.
    Airbnb,
    /// Hotels.com.
    HotelsCom,
    /// Tripadvisor.
    Tripadvisor,
    /// Agoda.
    Agoda,
    /// Hotelbeds wholesale.
    Hotelbeds,
    /// Seven Rooms distribution.
    Seven,
    /// Self-hosted or bespoke channel endpoint.
    Custom,
}

impl ChannelType {
    /// All known channel types, in declaration order.
    #[must_use]
    pub const fn all() -> [ChannelType; 9] {
        [
            ChannelType::BookingCom,
            ChannelType::Expedia,
            ChannelType::Airbnb,
            ChannelType::HotelsCom,
            ChannelType::Tripadvisor,
            ChannelType::Agoda,
            ChannelType::Hotelbeds,
            ChannelType::Seven,
            ChannelType::Custom,
        ]
    }

    /// Single-letter code used when deriving property identifiers.
    #[must_use]
    pub fn code_letter(&self) -> char {
        match self {
            ChannelType::BookingCom => 'B',
            ChannelType::Expedia => 'E',
            ChannelType::Airbnb => 'A',
            ChannelType::HotelsCom => 'H',
            ChannelType::Tripadvisor => 'T',
            ChannelType::Agoda => 'G',
            ChannelType::Hotelbeds => 'W',
            ChannelType::Seven => 'S',
            ChannelType::Custom => 'C',
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::BookingCom => write!(f, "booking_com"),
            ChannelType::Expedia => write!(f, "expedia"),
            ChannelType::Airbnb => write!(f, "airbnb"),
            ChannelType::HotelsCom => write!(f, "hotels_com"),
            ChannelType::Tripadvisor => write!(f, "tripadvisor"),
            ChannelType::Agoda => write!(f, "agoda"),
            ChannelType::Hotelbeds => write!(f, "hotelbeds"),
            ChannelType::Seven => write!(f, "seven"),
            ChannelType::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "booking_com" => Ok(ChannelType::BookingCom),
            "expedia" => Ok(ChannelType::Expedia),
            "airbnb" => Ok(ChannelType::Airbnb),
            "hotels_com" => Ok(ChannelType::HotelsCom),
            "tripadvisor" => Ok(ChannelType::Tripadvisor),
            "agoda" => Ok(ChannelType::Agoda),
            "hotelbeds" => Ok(ChannelType::Hotelbeds),
            "seven" => Ok(ChannelType::Seven),
            "custom" => Ok(ChannelType::Custom),
            _ => Err(format!("Unknown channel type: {s}")),
        }
    }
}

/// Lifecycle status of a channel integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Created but not yet set up.
    Pending,
    /// Fully set up and eligible for sync.
    Active,
    /// Last operation failed; held out of scheduling.
    Error,
    /// Disabled by an operator.
    Inactive,
    /// Connectivity test in progress.
    Testing,
}

impl std::fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationStatus::Pending => write!(f, "pending"),
            IntegrationStatus::Active => write!(f, "active"),
            IntegrationStatus::Error => write!(f, "error"),
            IntegrationStatus::Inactive => write!(f, "inactive"),
            IntegrationStatus::Testing => write!(f, "testing"),
        }
    }
}

impl std::str::FromStr for IntegrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(IntegrationStatus::Pending),
            "active" => Ok(IntegrationStatus::Active),
            "error" => Ok(IntegrationStatus::Error),
            "inactive" => Ok(IntegrationStatus::Inactive),
            "testing" => Ok(IntegrationStatus::Testing),
            _ => Err(format!("Unknown integration status: {s}")),
        }
    }
}

/// A hotel's connection to one distribution channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChannelIntegration {
    /// Unique identifier.
    pub id: Uuid,

    /// Internal hotel identifier.
    pub hotel_id: i64,

    /// Which channel this integration connects to.
    pub channel_type: ChannelType,

    /// Human-readable name shown in listings.
    pub channel_name: String,

    /// Lifecycle status.
    pub status: IntegrationStatus,

    /// API key credential, if the channel uses one.
    pub api_key: Option<String>,

    /// API secret paired with the key.
    pub api_secret: Option<String>,

    /// OAuth access token, for token-based channels.
    pub access_token: Option<String>,

    /// OAuth refresh token.
    pub refresh_token: Option<String>,

    /// Identifier of the property on the channel side.
    pub channel_property_id: Option<String>,

    /// Username credential, for channels using basic auth.
    pub channel_username: Option<String>,

    /// Password credential paired with the username.
    pub channel_password: Option<String>,

    /// Endpoint the channel delivers webhooks to.
    pub webhook_url: Option<String>,

    /// Shared secret used to verify webhook signatures.
    pub webhook_secret: Option<String>,

    /// Whether inbound webhooks are accepted for this integration.
    pub is_webhook_enabled: bool,

    /// Minutes between scheduled syncs before the integration counts as stale.
    pub sync_interval_minutes: i32,

    /// Whether changes are pushed to the channel as they happen.
    pub is_real_time_sync: bool,

    /// When the last sync attempt started, successful or not.
    pub last_sync_at: Option<DateTime<Utc>>,

    /// When the last fully successful sync completed.
    pub last_successful_sync: Option<DateTime<Utc>>,

    /// Message from the most recent failure.
    pub error_message: Option<String>,

    /// Whether the integration talks to the channel's sandbox.
    pub test_mode: bool,

    /// Channel-specific settings (base URL overrides, flags).
    pub channel_settings: Option<JsonValue>,

    /// Feature list advertised by the adapter at setup time.
    pub supported_features: Option<JsonValue>,

    /// User who created the integration.
    pub created_by: Option<i64>,

    /// User who last updated the integration.
    pub updated_by: Option<i64>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a channel integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelIntegration {
    pub hotel_id: i64,
    pub channel_type: ChannelType,
    pub channel_name: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub channel_property_id: Option<String>,
    pub channel_username: Option<String>,
    pub channel_password: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_webhook_enabled: Option<bool>,
    pub sync_interval_minutes: Option<i32>,
    pub is_real_time_sync: Option<bool>,
    pub test_mode: Option<bool>,
    pub channel_settings: Option<JsonValue>,
    pub created_by: Option<i64>,
}

/// Partial update for a channel integration.
///
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChannelIntegration {
    pub channel_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub channel_property_id: Option<String>,
    pub channel_username: Option<String>,
    pub channel_password: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub is_webhook_enabled: Option<bool>,
    pub sync_interval_minutes: Option<i32>,
    pub is_real_time_sync: Option<bool>,
    pub test_mode: Option<bool>,
    pub channel_settings: Option<JsonValue>,
    pub supported_features: Option<JsonValue>,
    pub updated_by: Option<i64>,
}

impl ChannelIntegration {
    /// Create a new integration. Starts in `pending` status.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: &CreateChannelIntegration,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO channel_integrations
                (hotel_id, channel_type, channel_name, api_key, api_secret,
                 access_token, refresh_token, channel_property_id,
                 channel_username, channel_password, webhook_url, webhook_secret,
                 is_webhook_enabled, sync_interval_minutes, is_real_time_sync,
                 test_mode, channel_settings, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    COALESCE($13, FALSE), COALESCE($14, 15), COALESCE($15, FALSE),
                    COALESCE($16, FALSE), $17, $18)
            RETURNING *
            ",
        )
        .bind(input.hotel_id)
        .bind(input.channel_type.to_string())
        .bind(&input.channel_name)
        .bind(&input.api_key)
        .bind(&input.api_secret)
        .bind(&input.access_token)
        .bind(&input.refresh_token)
        .bind(&input.channel_property_id)
        .bind(&input.channel_username)
        .bind(&input.channel_password)
        .bind(&input.webhook_url)
        .bind(&input.webhook_secret)
        .bind(input.is_webhook_enabled)
        .bind(input.sync_interval_minutes)
        .bind(input.is_real_time_sync)
        .bind(input.test_mode)
        .bind(&input.channel_settings)
        .bind(input.created_by)
        .fetch_one(pool)
        .await
    }

    /// Find an integration by ID.
    pub async fn find_by_id(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_integrations
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List all integrations for a hotel, newest first.
    pub async fn find_by_hotel(
        pool: &sqlx::PgPool,
        hotel_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_integrations
            WHERE hotel_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(hotel_id)
        .fetch_all(pool)
        .await
    }

    /// Find the integration a hotel has for a specific channel.
    pub async fn find_by_hotel_and_type(
        pool: &sqlx::PgPool,
        hotel_id: i64,
        channel_type: ChannelType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_integrations
            WHERE hotel_id = $1 AND channel_type = $2
            ",
        )
        .bind(hotel_id)
        .bind(channel_type.to_string())
        .fetch_optional(pool)
        .await
    }

    /// List integrations by status, optionally scoped to one hotel.
    pub async fn list_by_status(
        pool: &sqlx::PgPool,
        status: IntegrationStatus,
        hotel_id: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if let Some(hotel) = hotel_id {
            sqlx::query_as(
                r"
                SELECT * FROM channel_integrations
                WHERE status = $1 AND hotel_id = $2
                ORDER BY created_at DESC
                ",
            )
            .bind(status.to_string())
            .bind(hotel)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as(
                r"
                SELECT * FROM channel_integrations
                WHERE status = $1
                ORDER BY created_at DESC
                ",
            )
            .bind(status.to_string())
            .fetch_all(pool)
            .await
        }
    }

    /// List active integrations whose last sync is missing or older than
    /// their own sync interval.
    pub async fn find_needing_sync(pool: &sqlx::PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_integrations
            WHERE status = 'active'
                AND (last_sync_at IS NULL
                     OR last_sync_at < NOW() - make_interval(mins => sync_interval_minutes))
            ORDER BY last_sync_at ASC NULLS FIRST
            ",
        )
        .fetch_all(pool)
        .await
    }

    /// Apply a partial update. Returns the updated row.
    pub async fn update(
        pool: &sqlx::PgPool,
        id: Uuid,
        update: &UpdateChannelIntegration,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE channel_integrations
            SET channel_name = COALESCE($2, channel_name),
                api_key = COALESCE($3, api_key),
                api_secret = COALESCE($4, api_secret),
                access_token = COALESCE($5, access_token),
                refresh_token = COALESCE($6, refresh_token),
                channel_property_id = COALESCE($7, channel_property_id),
                channel_username = COALESCE($8, channel_username),
                channel_password = COALESCE($9, channel_password),
                webhook_url = COALESCE($10, webhook_url),
                webhook_secret = COALESCE($11, webhook_secret),
                is_webhook_enabled = COALESCE($12, is_webhook_enabled),
                sync_interval_minutes = COALESCE($13, sync_interval_minutes),
                is_real_time_sync = COALESCE($14, is_real_time_sync),
                test_mode = COALESCE($15, test_mode),
                channel_settings = COALESCE($16, channel_settings),
                supported_features = COALESCE($17, supported_features),
                updated_by = COALESCE($18, updated_by),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&update.channel_name)
        .bind(&update.api_key)
        .bind(&update.api_secret)
        .bind(&update.access_token)
        .bind(&update.refresh_token)
        .bind(&update.channel_property_id)
        .bind(&update.channel_username)
        .bind(&update.channel_password)
        .bind(&update.webhook_url)
        .bind(&update.webhook_secret)
        .bind(update.is_webhook_enabled)
        .bind(update.sync_interval_minutes)
        .bind(update.is_real_time_sync)
        .bind(update.test_mode)
        .bind(&update.channel_settings)
        .bind(&update.supported_features)
        .bind(update.updated_by)
        .fetch_optional(pool)
        .await
    }

    /// Set the lifecycle status, replacing the stored error message.
    pub async fn set_status(
        pool: &sqlx::PgPool,
        id: Uuid,
        status: IntegrationStatus,
        error_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_integrations
            SET status = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.to_string())
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful sync pass.
    pub async fn record_sync_success(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_integrations
            SET last_sync_at = NOW(),
                last_successful_sync = NOW(),
                error_message = NULL,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a failed sync pass. The integration drops to `error` status
    /// and stops being picked up by the scheduler.
    pub async fn record_sync_failure(
        pool: &sqlx::PgPool,
        id: Uuid,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_integrations
            SET status = 'error',
                error_message = $2,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an integration and its dependent rows.
    pub async fn delete(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            DELETE FROM channel_integrations
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if this integration is eligible for sync operations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, IntegrationStatus::Active)
    }

    /// Check whether a sync is due at `now`.
    ///
    /// Only active integrations are ever due. An integration that was never
    /// synced is always due.
    #[must_use]
    pub fn needs_sync(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.last_sync_at {
            None => true,
            Some(last) => now - last >= chrono::Duration::minutes(i64::from(self.sync_interval_minutes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_display() {
        assert_eq!(ChannelType::BookingCom.to_string(), "booking_com");
        assert_eq!(ChannelType::HotelsCom.to_string(), "hotels_com");
        assert_eq!(ChannelType::Seven.to_string(), "seven");
    }

    #[test]
    fn test_channel_type_from_str() {
        assert_eq!(
            "booking_com".parse::<ChannelType>().unwrap(),
            ChannelType::BookingCom
        );
        assert_eq!("AIRBNB".parse::<ChannelType>().unwrap(), ChannelType::Airbnb);
        assert!("ota_9000".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_channel_type_all_is_distinct() {
        let all = ChannelType::all();
        assert_eq!(all.len(), 9);
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_integration_status_round_trip() {
        for status in [
            IntegrationStatus::Pending,
            IntegrationStatus::Active,
            IntegrationStatus::Error,
            IntegrationStatus::Inactive,
            IntegrationStatus::Testing,
        ] {
            assert_eq!(
                status.to_string().parse::<IntegrationStatus>().unwrap(),
                status
            );
        }
    }

    fn create_test_integration() -> ChannelIntegration {
        ChannelIntegration {
            id: Uuid::new_v4(),
            hotel_id: 42,
            channel_type: ChannelType::BookingCom,
            channel_name: "Booking.com".to_string(),
            status: IntegrationStatus::Active,
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            access_token: None,
            refresh_token: None,
            channel_property_id: Some("H42B123".to_string()),
            channel_username: None,
            channel_password: None,
            webhook_url: None,
            webhook_secret: None,
            is_webhook_enabled: false,
            sync_interval_minutes: 15,
            is_real_time_sync: false,
            last_sync_at: None,
            last_successful_sync: None,
            error_message: None,
            test_mode: false,
            channel_settings: None,
            supported_features: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_sync_never_synced() {
        let integration = create_test_integration();
        assert!(integration.needs_sync(Utc::now()));
    }

    #[test]
    fn test_needs_sync_stale_and_fresh() {
        let now = Utc::now();

        let stale = ChannelIntegration {
            last_sync_at: Some(now - chrono::Duration::minutes(20)),
            ..create_test_integration()
        };
        assert!(stale.needs_sync(now));

        let fresh = ChannelIntegration {
            last_sync_at: Some(now - chrono::Duration::minutes(5)),
            ..create_test_integration()
        };
        assert!(!fresh.needs_sync(now));
    }

    #[test]
    fn test_needs_sync_ignores_non_active() {
        let now = Utc::now();
        for status in [
            IntegrationStatus::Pending,
            IntegrationStatus::Error,
            IntegrationStatus::Inactive,
            IntegrationStatus::Testing,
        ] {
            let integration = ChannelIntegration {
                status,
                ..create_test_integration()
            };
            assert!(!integration.needs_sync(now), "{status} should not be due");
        }
    }
}
