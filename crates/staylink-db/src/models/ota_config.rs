//! Channel configuration model.
//!
//! Per-channel credential bundles maintained by operators. Consulted as a
//! fallback when an integration is created without its own credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::integration::ChannelType;

/// Operator-managed credentials for one channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OtaConfiguration {
    /// Unique identifier.
    pub id: Uuid,

    /// Channel these credentials belong to. One row per channel.
    pub channel_type: ChannelType,

    /// API key credential.
    pub api_key: Option<String>,

    /// API secret paired with the key.
    pub api_secret: Option<String>,

    /// OAuth access token.
    pub access_token: Option<String>,

    /// OAuth refresh token.
    pub refresh_token: Option<String>,

    /// Override for the channel's API base URL.
    pub base_url: Option<String>,

    /// Whether the bundle may be used as a fallback.
    pub is_active: bool,

    /// When the bundle was last exercised against the channel.
    pub last_tested: Option<DateTime<Utc>>,

    /// Outcome of the last test, `success` or `failed`.
    pub test_status: Option<String>,

    /// Error from the last failed test.
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOtaConfiguration {
    pub channel_type: ChannelType,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub base_url: Option<String>,
}

impl OtaConfiguration {
    /// Create a configuration bundle. Fails if one already exists for the
    /// channel.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: &CreateOtaConfiguration,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO ota_configurations
                (channel_type, api_key, api_secret, access_token,
                 refresh_token, base_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(input.channel_type.to_string())
        .bind(&input.api_key)
        .bind(&input.api_secret)
        .bind(&input.access_token)
        .bind(&input.refresh_token)
        .bind(&input.base_url)
        .fetch_one(pool)
        .await
    }

    /// Find the active bundle for a channel.
    pub async fn find_active_by_type(
        pool: &sqlx::PgPool,
        channel_type: ChannelType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM ota_configurations
            WHERE channel_type = $1 AND is_active = TRUE
            ",
        )
        .bind(channel_type.to_string())
        .fetch_optional(pool)
        .await
    }

    /// List every configuration bundle.
    pub async fn list(pool: &sqlx::PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM ota_configurations
            ORDER BY channel_type ASC
            ",
        )
        .fetch_all(pool)
        .await
    }

    /// Replace the stored credentials.
    pub async fn update_credentials(
        pool: &sqlx::PgPool,
        id: Uuid,
        api_key: Option<&str>,
        api_secret: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE ota_configurations
            SET api_key = COALESCE($2, api_key),
                api_secret = COALESCE($3, api_secret),
                access_token = COALESCE($4, access_token),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(api_key)
        .bind(api_secret)
        .bind(access_token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the outcome of a connectivity test.
    pub async fn record_test(
        pool: &sqlx::PgPool,
        id: Uuid,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let status = if success { "success" } else { "failed" };
        let result = sqlx::query(
            r"
            UPDATE ota_configurations
            SET last_tested = NOW(),
                test_status = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deactivate a bundle so it stops serving as a fallback.
    pub async fn deactivate(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE ota_configurations
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if the bundle carries any usable credential.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.api_secret.is_some() || self.access_token.is_some()
    }
}
