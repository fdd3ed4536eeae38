//! # Channel Adapter Framework
//!
//! Vendor adapters connecting staylink to external distribution channels.
//!
//! This crate provides the abstraction for pushing inventory, rates and
//! availability to OTAs like Booking.com, Expedia and Airbnb, and for
//! turning their webhook payloads into one canonical event shape the
//! sync engine can process without vendor knowledge.
//!
//! ## Architecture
//!
//! - [`ChannelAdapter`](traits::ChannelAdapter) - trait every vendor module implements
//! - [`AdapterRegistry`](registry::AdapterRegistry) - shared lookup from channel type to adapter
//! - [`CanonicalEvent`](events::CanonicalEvent) - normalized inbound webhook event
//! - [`HttpClient`](adapters::http::HttpClient) - shared outbound client with retry and backoff
//!
//! ## Example
//!
//! ```ignore
//! use staylink_channel::prelude::*;
//!
//! // Build the registry once at startup
//! let registry = AdapterRegistry::with_defaults()?;
//!
//! // Resolve the adapter for an integration and test connectivity
//! let adapter = registry.resolve(integration.channel_type)?;
//! let test = adapter.test_connection(&integration).await;
//!
//! // Canonicalize an inbound webhook
//! let event = adapter.process_webhook(&integration, &payload).await;
//! if event.kind.is_booking_event() {
//!     // hand to the sync engine
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types with transient/permanent classification
//! - [`types`] - Connection test results, channel metadata, credential fields
//! - [`events`] - Canonical webhook events and payload extraction
//! - [`traits`] - The [`ChannelAdapter`](traits::ChannelAdapter) trait
//! - [`adapters`] - One module per vendor plus the shared HTTP client
//! - [`registry`] - Adapter lookup and static channel metadata

pub mod adapters;
pub mod error;
pub mod events;
pub mod registry;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use staylink_channel::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{ChannelError, ChannelResult};

    // The adapter trait
    pub use crate::traits::ChannelAdapter;

    // Connection and metadata types
    pub use crate::types::{ChannelInfo, ConnectionTest, CredentialField};

    // Canonical events
    pub use crate::events::{
        CanonicalEvent, EventKind, GuestRecord, ReservationDetails, StaySummary,
    };

    // Registry
    pub use crate::registry::{display_name, features_of, overview, AdapterRegistry};

    // HTTP plumbing
    pub use crate::adapters::http::{AuthScheme, HttpClient, HttpConfig, RetryPolicy};

    // The channel taxonomy lives in the database crate
    pub use staylink_db::models::ChannelType;
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
