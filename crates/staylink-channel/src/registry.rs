//! Adapter registry and static channel metadata.
//!
//! The registry maps a [`ChannelType`] to a shared adapter instance.
//! Services hold it behind an `Arc` and resolve adapters per request;
//! resolution of an unregistered type is an [`ChannelError::UnsupportedChannel`]
//! error rather than a panic, so a partially configured deployment
//! degrades to clean failures.

use std::collections::HashMap;
use std::sync::Arc;

use staylink_db::models::ChannelType;

use crate::adapters::http::HttpClient;
use crate::adapters::{
    AgodaAdapter, AirbnbAdapter, BookingComAdapter, CustomAdapter, ExpediaAdapter,
    HotelbedsAdapter, HotelsComAdapter, SevenAdapter, TripadvisorAdapter,
};
use crate::error::{ChannelError, ChannelResult};
use crate::traits::ChannelAdapter;
use crate::types::ChannelInfo;

/// Features advertised for channels without a curated list.
const FALLBACK_FEATURES: &[&str] = &["Availability sync", "Rate updates", "Webhook ingestion"];

/// Marketing display name for a channel type.
pub fn display_name(channel_type: ChannelType) -> &'static str {
    match channel_type {
        ChannelType::BookingCom => "Booking.com",
        ChannelType::Expedia => "Expedia",
        ChannelType::Airbnb => "Airbnb",
        ChannelType::HotelsCom => "Hotels.com",
        ChannelType::Tripadvisor => "TripAdvisor",
        ChannelType::Agoda => "Agoda",
        ChannelType::Hotelbeds => "Hotelbeds",
        ChannelType::Seven => "Seven",
        ChannelType::Custom => "Custom Integration",
    }
}

/// Feature list shown when offering a channel during onboarding.
pub fn features_of(channel_type: ChannelType) -> &'static [&'static str] {
    match channel_type {
        ChannelType::BookingCom => &[
            "Real-time availability sync",
            "Rate management",
            "Webhook support",
            "Multi-currency support",
            "Room type mapping",
            "Guest reservation management",
        ],
        ChannelType::Expedia => &[
            "Inventory sync",
            "Rate updates",
            "XML API integration",
            "Multi-property support",
            "Guest management",
        ],
        ChannelType::Airbnb => &[
            "Calendar sync",
            "Pricing updates",
            "Instant booking",
            "Guest communication",
            "Property listing management",
        ],
        ChannelType::HotelsCom => &[
            "Availability updates",
            "Rate synchronization",
            "Guest reservation sync",
            "Property information management",
        ],
        ChannelType::Tripadvisor => &[
            "Property listing sync",
            "Guest review management",
            "Availability updates",
            "Rate synchronization",
        ],
        ChannelType::Agoda => &[
            "Inventory management",
            "Rate updates",
            "Guest reservation sync",
            "Multi-language support",
        ],
        ChannelType::Custom => &[
            "Custom API integration",
            "Flexible data mapping",
            "Webhook support",
            "Custom authentication",
        ],
        ChannelType::Hotelbeds | ChannelType::Seven => FALLBACK_FEATURES,
    }
}

/// Static overview of one channel: name plus advertised features.
pub fn overview(channel_type: ChannelType) -> ChannelInfo {
    ChannelInfo {
        channel_type,
        display_name: display_name(channel_type),
        features: features_of(channel_type),
    }
}

/// Shared, immutable set of channel adapters keyed by channel type.
///
/// Registration happens once at startup; afterwards the registry is
/// read-only and safe to share across tasks.
pub struct AdapterRegistry {
    adapters: HashMap<ChannelType, Arc<dyn ChannelAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in adapter registered,
    /// sharing a single HTTP client across all of them.
    pub fn with_defaults() -> ChannelResult<Self> {
        let http = HttpClient::new()?;
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(BookingComAdapter::new(http.clone())));
        registry.register(Arc::new(ExpediaAdapter::new(http.clone())));
        registry.register(Arc::new(AirbnbAdapter::new(http.clone())));
        registry.register(Arc::new(HotelsComAdapter::new(http.clone())));
        registry.register(Arc::new(TripadvisorAdapter::new(http.clone())));
        registry.register(Arc::new(AgodaAdapter::new(http.clone())));
        registry.register(Arc::new(HotelbedsAdapter::new(http.clone())));
        registry.register(Arc::new(SevenAdapter::new(http.clone())));
        registry.register(Arc::new(CustomAdapter::new(http)));
        Ok(registry)
    }

    /// Registers an adapter under its own channel type, replacing any
    /// previous adapter for that type.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        self.adapters.insert(adapter.channel_type(), adapter);
    }

    /// Looks up the adapter for a channel type.
    pub fn resolve(&self, channel_type: ChannelType) -> ChannelResult<Arc<dyn ChannelAdapter>> {
        self.adapters
            .get(&channel_type)
            .cloned()
            .ok_or_else(|| ChannelError::UnsupportedChannel {
                channel_type: channel_type.to_string(),
            })
    }

    pub fn contains(&self, channel_type: ChannelType) -> bool {
        self.adapters.contains_key(&channel_type)
    }

    /// Registered channel types, in declaration order.
    pub fn supported_types(&self) -> Vec<ChannelType> {
        ChannelType::all()
            .into_iter()
            .filter(|channel_type| self.adapters.contains_key(channel_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        AdapterRegistry::new()
    }
}
