//! Database entity models for staylink-db.
//!
//! These models represent the database tables and provide
//! type-safe interactions with PostgreSQL.

pub mod availability;
pub mod integration;
pub mod mapping;
pub mod ota_config;
pub mod rate_plan;
pub mod sync_log;

pub use availability::{
    derived_available, derived_status, AvailabilityStatus, ChannelAvailability, OccupancyUpdate,
    UpsertAvailability,
};
pub use integration::{
    ChannelIntegration, ChannelType, CreateChannelIntegration, IntegrationStatus,
    UpdateChannelIntegration,
};
pub use mapping::{ChannelMapping, CreateChannelMapping};
pub use ota_config::{CreateOtaConfiguration, OtaConfiguration};
pub use rate_plan::{ChannelRatePlan, CreateRatePlan, RateModifierType, RatePlanType};
pub use sync_log::{
    ChannelSyncLog, CreateSyncLog, SyncCounters, SyncDirection, SyncOperation, SyncOutcome,
    SyncStatus,
};
