//! Room-type mapping model.
//!
//! Links an internal room type to the identifier the channel uses for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Mapping between an internal room type and a channel-side room code.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChannelMapping {
    /// Unique identifier.
    pub id: Uuid,

    /// Integration this mapping belongs to.
    pub integration_id: Uuid,

    /// Internal room type identifier.
    pub roomtype_id: i64,

    /// Identifier the channel uses for this room type.
    pub channel_room_type_id: String,

    /// Display name on the channel side.
    pub channel_room_type_name: Option<String>,

    /// Rate plan identifier on the channel side.
    pub channel_rate_plan_id: Option<String>,

    /// Rate plan display name on the channel side.
    pub channel_rate_plan_name: Option<String>,

    /// Amenities advertised on the channel.
    pub channel_amenities: Option<Vec<String>>,

    /// Description shown on the channel.
    pub channel_description: Option<String>,

    /// Image URLs pushed to the channel.
    pub channel_images: Option<Vec<String>>,

    /// Whether the mapping participates in sync and resolution.
    pub is_active: bool,

    /// Channel-specific transformation rules.
    pub mapping_rules: Option<JsonValue>,

    /// Free-form extension fields.
    pub custom_fields: Option<JsonValue>,

    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a room-type mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelMapping {
    pub integration_id: Uuid,
    pub roomtype_id: i64,
    pub channel_room_type_id: String,
    pub channel_room_type_name: Option<String>,
    pub channel_rate_plan_id: Option<String>,
    pub channel_rate_plan_name: Option<String>,
    pub channel_amenities: Option<Vec<String>>,
    pub channel_description: Option<String>,
    pub channel_images: Option<Vec<String>>,
    pub mapping_rules: Option<JsonValue>,
    pub custom_fields: Option<JsonValue>,
    pub created_by: Option<i64>,
}

impl ChannelMapping {
    /// Create a new mapping.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: &CreateChannelMapping,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO channel_mappings
                (integration_id, roomtype_id, channel_room_type_id,
                 channel_room_type_name, channel_rate_plan_id,
                 channel_rate_plan_name, channel_amenities, channel_description,
                 channel_images, mapping_rules, custom_fields, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            ",
        )
        .bind(input.integration_id)
        .bind(input.roomtype_id)
        .bind(&input.channel_room_type_id)
        .bind(&input.channel_room_type_name)
        .bind(&input.channel_rate_plan_id)
        .bind(&input.channel_rate_plan_name)
        .bind(&input.channel_amenities)
        .bind(&input.channel_description)
        .bind(&input.channel_images)
        .bind(&input.mapping_rules)
        .bind(&input.custom_fields)
        .bind(input.created_by)
        .fetch_one(pool)
        .await
    }

    /// Find a mapping by ID.
    pub async fn find_by_id(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_mappings
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List mappings for an integration, optionally active-only.
    pub async fn list_by_integration(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if active_only {
            sqlx::query_as(
                r"
                SELECT * FROM channel_mappings
                WHERE integration_id = $1 AND is_active = TRUE
                ORDER BY roomtype_id ASC
                ",
            )
            .bind(integration_id)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as(
                r"
                SELECT * FROM channel_mappings
                WHERE integration_id = $1
                ORDER BY roomtype_id ASC
                ",
            )
            .bind(integration_id)
            .fetch_all(pool)
            .await
        }
    }

    /// Resolve a channel-side room identifier to its mapping.
    ///
    /// Only active mappings resolve.
    pub async fn find_by_channel_room(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        channel_room_type_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_mappings
            WHERE integration_id = $1
                AND channel_room_type_id = $2
                AND is_active = TRUE
            ",
        )
        .bind(integration_id)
        .bind(channel_room_type_id)
        .fetch_optional(pool)
        .await
    }

    /// Find the mapping for an internal room type on an integration.
    pub async fn find_by_roomtype(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        roomtype_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_mappings
            WHERE integration_id = $1
                AND roomtype_id = $2
                AND is_active = TRUE
            ",
        )
        .bind(integration_id)
        .bind(roomtype_id)
        .fetch_optional(pool)
        .await
    }

    /// Deactivate a mapping without deleting it.
    pub async fn deactivate(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_mappings
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a mapping.
    pub async fn delete(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            DELETE FROM channel_mappings
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
