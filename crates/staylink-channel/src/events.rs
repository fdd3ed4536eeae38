//! Vendor-agnostic representation of inbound channel events.
//!
//! Every adapter's `process_webhook` reduces a raw vendor payload to a
//! [`CanonicalEvent`]. Canonicalization is total: payloads that cannot be
//! understood produce an `Unknown` event rather than an error, so the
//! decision of what to do with them stays with the caller.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Keys a vendor payload may use for its event type.
pub const EVENT_TYPE_KEYS: &[&str] = &["type", "event", "event_type", "action"];

/// Keys for the room-type reference (internal id or channel-side code).
pub const ROOM_KEYS: &[&str] = &[
    "roomTypeId",
    "room_type_id",
    "roomType",
    "channelRoomTypeId",
    "channel_room_type_id",
];

/// Keys for the stay start date.
pub const CHECK_IN_KEYS: &[&str] = &["startDate", "start_date", "checkIn", "check_in"];

/// Keys for the stay end date.
pub const CHECK_OUT_KEYS: &[&str] = &["endDate", "end_date", "checkOut", "check_out"];

/// Keys for the number of rooms booked.
pub const ROOM_COUNT_KEYS: &[&str] = &["rooms", "quantity", "numberOfRooms", "num_rooms"];

/// Keys for the channel-side reservation identifier.
pub const RESERVATION_ID_KEYS: &[&str] = &["reservation_id", "booking_id", "id"];

/// Classified kind of an inbound channel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Reservation,
    Cancellation,
    Modification,
    Review,
    Inventory,
    Unknown,
}

impl EventKind {
    /// Classify a vendor event-type string.
    ///
    /// Matching is case-insensitive and treats `.`, `-` and spaces as `_`,
    /// so `booking.created` and `BOOKING-CREATED` both classify as
    /// `Reservation`.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '.' || c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "reservation" | "booking" | "new_booking" | "booking_create" | "booking_created"
            | "reservation_created" | "create" => EventKind::Reservation,
            "cancellation" | "cancel" | "cancelled" | "canceled" | "booking_cancel"
            | "booking_cancelled" | "reservation_cancelled" => EventKind::Cancellation,
            "modification" | "modify" | "modified" | "update" | "updated" | "booking_update"
            | "booking_updated" | "booking_modified" | "reservation_modified"
            | "reservation_updated" => EventKind::Modification,
            "review" | "guest_review" | "new_review" | "review_created" | "review_updated" => {
                EventKind::Review
            }
            "inventory" | "availability" | "inventory_update" | "inventory_updated"
            | "availability_update" => EventKind::Inventory,
            _ => EventKind::Unknown,
        }
    }

    /// Classify a payload by probing the usual event-type keys, top level
    /// first, then the nested `data` object.
    #[must_use]
    pub fn classify_payload(payload: &JsonValue) -> Self {
        if let Some(raw) = first_str(payload, EVENT_TYPE_KEYS) {
            return EventKind::classify(&raw);
        }
        let inner = inner_object(payload);
        if !std::ptr::eq(inner, payload) {
            if let Some(raw) = first_str(inner, EVENT_TYPE_KEYS) {
                return EventKind::classify(&raw);
            }
        }
        EventKind::Unknown
    }

    /// Whether this event affects bookings and therefore availability.
    #[must_use]
    pub fn is_booking_event(&self) -> bool {
        matches!(
            self,
            EventKind::Reservation | EventKind::Cancellation | EventKind::Modification
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Reservation => "reservation",
            EventKind::Cancellation => "cancellation",
            EventKind::Modification => "modification",
            EventKind::Review => "review",
            EventKind::Inventory => "inventory",
            EventKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// The stay a booking event refers to: which room type, which dates, how
/// many rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaySummary {
    /// Room-type reference as the channel sent it. May be an internal
    /// numeric id rendered as a string, or a channel-side code that needs
    /// a mapping lookup.
    pub channel_room_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Number of rooms the event covers, at least 1.
    pub rooms: i32,
}

impl StaySummary {
    /// Extract a stay summary from a payload object, resolving the common
    /// key spellings. Returns `None` when the room reference or either
    /// date is missing, which callers treat as "nothing to apply".
    #[must_use]
    pub fn from_payload(payload: &JsonValue) -> Option<Self> {
        let channel_room_code = first_str(payload, ROOM_KEYS)?;
        let check_in = first_date(payload, CHECK_IN_KEYS)?;
        let check_out = first_date(payload, CHECK_OUT_KEYS)?;
        let rooms = match first_i64(payload, ROOM_COUNT_KEYS) {
            Some(n) if n > 0 => n as i32,
            _ => 1,
        };
        Some(StaySummary {
            channel_room_code,
            check_in,
            check_out,
            rooms,
        })
    }

    /// The room reference parsed as an internal numeric room-type id, when
    /// it is one.
    #[must_use]
    pub fn direct_roomtype_id(&self) -> Option<i64> {
        self.channel_room_code.trim().parse().ok()
    }

    /// Number of nights covered, negative when the range is inverted.
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Whether the date range is usable for availability application.
    #[must_use]
    pub fn has_valid_range(&self) -> bool {
        self.check_in < self.check_out
    }
}

/// Canonical guest record forwarded to the property-management system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestRecord {
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// Normalized to `+` followed by digits only.
    pub phone: Option<String>,
    /// Channel-side property identifier the booking belongs to.
    pub property: Option<String>,
    pub room_number: String,
    pub number_of_guests: i32,
    pub payment_method: String,
    pub receiving_account: String,
    pub amount_paid: Decimal,
    pub outstanding: Decimal,
    /// Channel attribution, usually the integration's display name.
    pub reservation_source: Option<String>,
}

impl Default for GuestRecord {
    fn default() -> Self {
        GuestRecord {
            full_name: None,
            email: None,
            phone: None,
            property: None,
            room_number: String::new(),
            number_of_guests: 1,
            payment_method: "CHANNEL_MANAGER".to_string(),
            receiving_account: "OTA".to_string(),
            amount_paid: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            reservation_source: None,
        }
    }
}

impl GuestRecord {
    /// Build a guest record from a payload object.
    ///
    /// `fallback_property` fills `property` when the payload has none
    /// (typically the integration's channel property id), and `source`
    /// records where the booking came from.
    #[must_use]
    pub fn from_payload(
        payload: &JsonValue,
        fallback_property: Option<&str>,
        source: &str,
    ) -> Self {
        let guest = &payload["guest"];

        let full_name = first_str(guest, &["name", "full_name", "fullName"])
            .or_else(|| first_str(payload, &["guest_name", "guestName"]));
        let email = first_str(guest, &["email"]).or_else(|| first_str(payload, &["email"]));
        let phone = first_str(guest, &["phone", "phoneNumber", "phone_number"])
            .or_else(|| first_str(payload, &["phone", "phoneNumber", "phone_number"]))
            .and_then(|p| normalize_phone(&p));

        let property = first_str(payload, &["property_id", "propertyId", "property"])
            .or_else(|| fallback_property.map(str::to_string));
        let room_number =
            first_str(payload, &["room_number", "roomNumber"]).unwrap_or_default();

        let number_of_guests = first_i64(
            payload,
            &["number_of_guests", "numberOfGuests", "guests", "rooms"],
        )
        .filter(|n| *n > 0)
        .map_or(1, |n| n as i32);

        let amount_paid =
            first_decimal(payload, &["amount_paid", "amountPaid"]).unwrap_or(Decimal::ZERO);
        let outstanding =
            first_decimal(payload, &["outstanding", "balance_due"]).unwrap_or(Decimal::ZERO);

        GuestRecord {
            full_name,
            email,
            phone,
            property,
            room_number,
            number_of_guests,
            amount_paid,
            outstanding,
            reservation_source: Some(source.to_string()),
            ..GuestRecord::default()
        }
    }
}

/// Everything a booking event carries beyond its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDetails {
    /// Channel-side reservation identifier, used for dedup downstream.
    pub source_reservation_id: Option<String>,
    pub stay: StaySummary,
    pub guest: Option<GuestRecord>,
    pub total_amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl ReservationDetails {
    /// Details with just a stay, no guest or money attached.
    #[must_use]
    pub fn stay_only(stay: StaySummary) -> Self {
        ReservationDetails {
            source_reservation_id: None,
            stay,
            guest: None,
            total_amount: None,
            currency: None,
        }
    }
}

/// The vendor-agnostic result of processing one inbound webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub kind: EventKind,
    /// Present for booking events the adapter could make sense of.
    pub reservation: Option<ReservationDetails>,
    /// For modifications: the stay as it was before the change, so the
    /// prior occupancy can be reversed before the new stay is applied.
    pub previous: Option<StaySummary>,
    /// Adapter remark, e.g. why an unknown payload was not processed.
    pub note: Option<String>,
    /// The payload as received, kept for audit and replay.
    pub raw: JsonValue,
}

impl CanonicalEvent {
    /// Event of a given kind with no details attached yet.
    #[must_use]
    pub fn new(kind: EventKind, raw: JsonValue) -> Self {
        CanonicalEvent {
            kind,
            reservation: None,
            previous: None,
            note: None,
            raw,
        }
    }

    /// Event for a payload no handler recognized.
    #[must_use]
    pub fn unknown(raw: JsonValue) -> Self {
        CanonicalEvent::new(EventKind::Unknown, raw).with_note("unrecognized webhook type")
    }

    /// Attach reservation details.
    #[must_use]
    pub fn with_reservation(mut self, details: ReservationDetails) -> Self {
        self.reservation = Some(details);
        self
    }

    /// Attach the pre-modification stay.
    #[must_use]
    pub fn with_previous(mut self, prior: StaySummary) -> Self {
        self.previous = Some(prior);
        self
    }

    /// Attach an adapter remark.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The working object of a payload: its `data` member when that is an
/// object, otherwise the payload itself.
#[must_use]
pub fn inner_object(payload: &JsonValue) -> &JsonValue {
    match payload.get("data") {
        Some(data) if data.is_object() => data,
        _ => payload,
    }
}

/// First non-empty string value under any of the given keys. Bare JSON
/// numbers are accepted and rendered, since room codes arrive both ways.
#[must_use]
pub fn first_str(payload: &JsonValue, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(key) {
            Some(JsonValue::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(JsonValue::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First integer value under any of the given keys, accepting numeric
/// strings and whole floats.
#[must_use]
pub fn first_i64(payload: &JsonValue, keys: &[&str]) -> Option<i64> {
    for key in keys {
        let Some(value) = payload.get(key) else {
            continue;
        };
        if let Some(n) = value.as_i64() {
            return Some(n);
        }
        if let Some(s) = value.as_str() {
            if let Ok(n) = s.trim().parse() {
                return Some(n);
            }
        }
        if let Some(f) = value.as_f64() {
            if f.is_finite() {
                return Some(f as i64);
            }
        }
    }
    None
}

/// First parseable date under any of the given keys.
#[must_use]
pub fn first_date(payload: &JsonValue, keys: &[&str]) -> Option<NaiveDate> {
    for key in keys {
        if let Some(s) = payload.get(key).and_then(JsonValue::as_str) {
            if let Some(date) = parse_date(s) {
                return Some(date);
            }
        }
    }
    None
}

/// First decimal amount under any of the given keys.
#[must_use]
pub fn first_decimal(payload: &JsonValue, keys: &[&str]) -> Option<Decimal> {
    for key in keys {
        let Some(value) = payload.get(key) else {
            continue;
        };
        if let Some(s) = value.as_str() {
            if let Ok(d) = s.trim().parse() {
                return Some(d);
            }
        }
        if let Some(n) = value.as_i64() {
            return Some(Decimal::from(n));
        }
        if let Some(f) = value.as_f64() {
            if let Some(d) = Decimal::from_f64_retain(f) {
                return Some(d);
            }
        }
    }
    None
}

/// Parse a date from the formats channels actually send: plain ISO dates
/// and full timestamps with or without an offset.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// Normalize a phone number to `+` followed by digits only. Returns `None`
/// when no digits remain.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("+{digits}"))
}
