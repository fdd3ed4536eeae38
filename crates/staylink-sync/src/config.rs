//! Configuration for the sync engine, scheduler, onboarding and PMS forwarding.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the sync engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rolling window of availability pushed outbound, in days from today.
    #[serde(default = "default_availability_window_days")]
    pub availability_window_days: u32,
}

fn default_availability_window_days() -> u32 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            availability_window_days: default_availability_window_days(),
        }
    }
}

impl EngineConfig {
    pub fn with_availability_window_days(mut self, days: u32) -> Self {
        self.availability_window_days = days.max(1);
        self
    }
}

/// Configuration for the periodic sync scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between sweeps for stale integrations.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Maximum number of integrations synced concurrently per sweep.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_tick_secs() -> u64 {
    300
}

fn default_concurrency() -> usize {
    4
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_tick_secs(mut self, secs: u64) -> Self {
        self.tick_secs = secs.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sweep interval as a [`Duration`]. Never zero.
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

/// Configuration for forwarding guest records to the property management system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmsConfig {
    /// Master switch. When false nothing is forwarded.
    #[serde(default)]
    pub enabled: bool,

    /// Target endpoint. A `{hotelId}` placeholder is substituted per record;
    /// without one the hotel id is appended as a query parameter.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional API key sent as an `X-API-Key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Capacity of the in-process forward queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delivery attempts per record before dropping it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts, doubled on each retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for PmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl PmsConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.enabled = true;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }
}

/// Seed data written by integration auto-setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Days of availability seeded from today, one row per day.
    #[serde(default = "default_seed_window_days")]
    pub seed_window_days: u32,

    /// Room count on seeded availability rows when the caller supplies none.
    #[serde(default = "default_seed_total_rooms")]
    pub seed_total_rooms: i32,

    /// Base rate on the seeded default rate plan.
    #[serde(default = "default_seed_base_rate")]
    pub seed_base_rate: Decimal,

    /// Currency for seeded rates and availability.
    #[serde(default = "default_seed_currency")]
    pub seed_currency: String,
}

fn default_seed_window_days() -> u32 {
    30
}

fn default_seed_total_rooms() -> i32 {
    10
}

fn default_seed_base_rate() -> Decimal {
    Decimal::new(100, 0)
}

fn default_seed_currency() -> String {
    "USD".to_string()
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            seed_window_days: default_seed_window_days(),
            seed_total_rooms: default_seed_total_rooms(),
            seed_base_rate: default_seed_base_rate(),
            seed_currency: default_seed_currency(),
        }
    }
}

impl OnboardingConfig {
    pub fn with_seed_window_days(mut self, days: u32) -> Self {
        self.seed_window_days = days.max(1);
        self
    }
}
