//! Vendor adapter implementations.
//!
//! One module per channel type. All adapters share the HTTP plumbing in
//! [`http`] and the canonicalization helpers in [`crate::events`]; what
//! differs per vendor is auth, endpoint layout, and payload shape, and
//! that stays inside each module.

pub mod http;

mod agoda;
mod airbnb;
mod booking_com;
mod custom;
mod expedia;
mod hotelbeds;
mod hotels_com;
mod seven;
mod tripadvisor;

pub use agoda::AgodaAdapter;
pub use airbnb::AirbnbAdapter;
pub use booking_com::BookingComAdapter;
pub use custom::CustomAdapter;
pub use expedia::ExpediaAdapter;
pub use hotelbeds::HotelbedsAdapter;
pub use hotels_com::HotelsComAdapter;
pub use seven::SevenAdapter;
pub use tripadvisor::TripadvisorAdapter;

use serde_json::Value as JsonValue;
use staylink_db::models::ChannelIntegration;

/// String value from the integration's channel settings JSON.
pub(crate) fn settings_str(integration: &ChannelIntegration, key: &str) -> Option<String> {
    integration
        .channel_settings
        .as_ref()
        .and_then(|settings| settings.get(key))
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Vendor API base URL: the integration's `base_url` setting when present,
/// the vendor default otherwise. Trailing slashes are trimmed so path
/// joining stays uniform.
pub(crate) fn resolve_base_url(integration: &ChannelIntegration, default_base: &str) -> String {
    settings_str(integration, "base_url")
        .unwrap_or_else(|| default_base.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// The integration's channel property id, or empty when unset.
pub(crate) fn property_id(integration: &ChannelIntegration) -> &str {
    integration.channel_property_id.as_deref().unwrap_or("")
}
