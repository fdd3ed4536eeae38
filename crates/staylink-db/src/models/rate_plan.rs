//! Rate plan model.
//!
//! Pricing objects a channel sells rooms under. A plan carries a base rate
//! plus an optional modifier and stay restrictions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of rate plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RatePlanType {
    /// Default flexible rate.
    Standard,
    /// Reduced rate, usually with stricter cancellation.
    Discount,
    /// Room bundled with extras.
    Package,
    /// Time-limited promotional rate.
    Promotional,
    /// Negotiated corporate rate.
    Corporate,
    /// Group booking rate.
    Group,
}

impl std::fmt::Display for RatePlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatePlanType::Standard => write!(f, "standard"),
            RatePlanType::Discount => write!(f, "discount"),
            RatePlanType::Package => write!(f, "package"),
            RatePlanType::Promotional => write!(f, "promotional"),
            RatePlanType::Corporate => write!(f, "corporate"),
            RatePlanType::Group => write!(f, "group"),
        }
    }
}

impl std::str::FromStr for RatePlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(RatePlanType::Standard),
            "discount" => Ok(RatePlanType::Discount),
            "package" => Ok(RatePlanType::Package),
            "promotional" => Ok(RatePlanType::Promotional),
            "corporate" => Ok(RatePlanType::Corporate),
            "group" => Ok(RatePlanType::Group),
            _ => Err(format!("Unknown rate plan type: {s}")),
        }
    }
}

/// How a rate modifier is applied to the base rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RateModifierType {
    /// Modifier is a percentage added to (or, if negative, taken off) the base.
    Percentage,
    /// Modifier is an absolute amount added to the base.
    FixedAmount,
    /// Modifier multiplies the base.
    Multiplier,
}

impl std::fmt::Display for RateModifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateModifierType::Percentage => write!(f, "percentage"),
            RateModifierType::FixedAmount => write!(f, "fixed_amount"),
            RateModifierType::Multiplier => write!(f, "multiplier"),
        }
    }
}

impl std::str::FromStr for RateModifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentage" => Ok(RateModifierType::Percentage),
            "fixed_amount" => Ok(RateModifierType::FixedAmount),
            "multiplier" => Ok(RateModifierType::Multiplier),
            _ => Err(format!("Unknown rate modifier type: {s}")),
        }
    }
}

/// A pricing object for one room type on one integration.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChannelRatePlan {
    /// Unique identifier.
    pub id: Uuid,

    /// Integration this plan belongs to.
    pub integration_id: Uuid,

    /// Internal room type identifier.
    pub roomtype_id: i64,

    /// Identifier of the plan on the channel side.
    pub channel_rate_plan_id: String,

    /// Display name on the channel side.
    pub channel_rate_plan_name: Option<String>,

    /// Kind of plan.
    pub rate_plan_type: RatePlanType,

    /// Nightly base rate.
    pub base_rate: Decimal,

    /// Currency of the base rate.
    pub currency: String,

    /// Minimum stay length in nights.
    pub min_stay: Option<i32>,

    /// Maximum stay length in nights.
    pub max_stay: Option<i32>,

    /// Whether arrivals are blocked under this plan.
    pub closed_to_arrival: bool,

    /// Whether departures are blocked under this plan.
    pub closed_to_departure: bool,

    /// Days ahead a booking must be made.
    pub advance_booking_days: Option<i32>,

    /// Cancellation policy text pushed to the channel.
    pub cancellation_policy: Option<String>,

    /// Season-scoped rate overrides.
    pub seasonal_rates: Option<JsonValue>,

    /// Weekday-scoped rate overrides.
    pub day_of_week_rates: Option<JsonValue>,

    /// Date-scoped rate overrides.
    pub special_dates: Option<JsonValue>,

    /// Modifier applied on top of the base rate.
    pub rate_modifier: Option<Decimal>,

    /// How the modifier is applied.
    pub modifier_type: Option<RateModifierType>,

    /// Whether the plan is currently sold.
    pub is_active: bool,

    /// Additional restrictions as JSON.
    pub restrictions: Option<JsonValue>,

    /// What the rate includes.
    pub inclusions: Option<Vec<String>>,

    /// What the rate excludes.
    pub exclusions: Option<Vec<String>>,

    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a rate plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRatePlan {
    pub integration_id: Uuid,
    pub roomtype_id: i64,
    pub channel_rate_plan_id: String,
    pub channel_rate_plan_name: Option<String>,
    pub rate_plan_type: RatePlanType,
    pub base_rate: Decimal,
    pub currency: String,
    pub min_stay: Option<i32>,
    pub max_stay: Option<i32>,
    pub rate_modifier: Option<Decimal>,
    pub modifier_type: Option<RateModifierType>,
    pub cancellation_policy: Option<String>,
    pub created_by: Option<i64>,
}

impl ChannelRatePlan {
    /// Create a new rate plan.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: &CreateRatePlan,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO channel_rate_plans
                (integration_id, roomtype_id, channel_rate_plan_id,
                 channel_rate_plan_name, rate_plan_type, base_rate, currency,
                 min_stay, max_stay, rate_modifier, modifier_type,
                 cancellation_policy, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            ",
        )
        .bind(input.integration_id)
        .bind(input.roomtype_id)
        .bind(&input.channel_rate_plan_id)
        .bind(&input.channel_rate_plan_name)
        .bind(input.rate_plan_type.to_string())
        .bind(input.base_rate)
        .bind(&input.currency)
        .bind(input.min_stay)
        .bind(input.max_stay)
        .bind(input.rate_modifier)
        .bind(input.modifier_type.map(|m| m.to_string()))
        .bind(&input.cancellation_policy)
        .bind(input.created_by)
        .fetch_one(pool)
        .await
    }

    /// Find a rate plan by ID.
    pub async fn find_by_id(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_rate_plans
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List active plans for an integration.
    pub async fn list_by_integration(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_rate_plans
            WHERE integration_id = $1 AND is_active = TRUE
            ORDER BY roomtype_id ASC, channel_rate_plan_id ASC
            ",
        )
        .bind(integration_id)
        .fetch_all(pool)
        .await
    }

    /// List active plans for one room type.
    pub async fn list_for_roomtype(
        pool: &sqlx::PgPool,
        integration_id: Uuid,
        roomtype_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM channel_rate_plans
            WHERE integration_id = $1 AND roomtype_id = $2 AND is_active = TRUE
            ORDER BY channel_rate_plan_id ASC
            ",
        )
        .bind(integration_id)
        .bind(roomtype_id)
        .fetch_all(pool)
        .await
    }

    /// Change the base rate of a plan.
    pub async fn set_base_rate(
        pool: &sqlx::PgPool,
        id: Uuid,
        base_rate: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_rate_plans
            SET base_rate = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(base_rate)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stop selling a plan without deleting it.
    pub async fn deactivate(pool: &sqlx::PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE channel_rate_plans
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The rate after the modifier is applied to the base.
    #[must_use]
    pub fn effective_rate(&self) -> Decimal {
        match (self.rate_modifier, self.modifier_type) {
            (Some(modifier), Some(RateModifierType::Percentage)) => {
                self.base_rate + self.base_rate * modifier / Decimal::ONE_HUNDRED
            }
            (Some(modifier), Some(RateModifierType::FixedAmount)) => self.base_rate + modifier,
            (Some(modifier), Some(RateModifierType::Multiplier)) => self.base_rate * modifier,
            _ => self.base_rate,
        }
    }
}
