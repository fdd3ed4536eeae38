//! # Staylink Sync
//!
//! Synchronization engine for the staylink channel manager.
//!
//! This crate provides:
//! - Outbound pushes of inventory, rates and availability to OTA channels
//! - Inbound webhook canonicalization and occupancy application
//! - A periodic scheduler with per-integration failure isolation
//! - Guest-record forwarding to the property-management system
//! - Integration onboarding with connectivity probes and seed data
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use staylink_channel::registry::AdapterRegistry;
//! use staylink_sync::{PgSyncStore, SyncEngine, SyncScheduler};
//!
//! let store = Arc::new(PgSyncStore::new(pool));
//! let registry = Arc::new(AdapterRegistry::with_defaults()?);
//! let engine = Arc::new(SyncEngine::new(store, registry));
//!
//! let scheduler = SyncScheduler::new(engine.clone());
//! scheduler.run().await;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod occupancy;
pub mod onboarding;
pub mod pms;
pub mod scheduler;
pub mod statistics;
pub mod store;

mod webhook;

// Re-exports for convenience
pub use config::{EngineConfig, OnboardingConfig, PmsConfig, SchedulerConfig};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use onboarding::{OnboardingService, RegisterIntegration};
pub use pms::{GuestForward, PmsForwarder};
pub use scheduler::SyncScheduler;
pub use statistics::{SyncStatistics, DEFAULT_STATISTICS_WINDOW_DAYS};
pub use store::{PgSyncStore, SyncStore};
