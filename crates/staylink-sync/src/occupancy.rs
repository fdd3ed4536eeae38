//! Occupancy delta planning for inbound booking events.
//!
//! Pure functions that turn a canonical event into the ordered list of
//! per-stay room adjustments the engine applies to the availability
//! calendar. No I/O happens here; clamping against room totals is done
//! row by row when the adjustments are persisted.

use chrono::NaiveDate;

use staylink_channel::events::{inner_object, CanonicalEvent, EventKind, StaySummary};

/// One stay's worth of occupancy change: the channel-side room reference,
/// the nights it covers and the signed room count to apply per night.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayAdjustment {
    pub stay: StaySummary,
    /// Positive takes rooms, negative releases them.
    pub rooms: i32,
}

/// Calendar nights a stay occupies. The checkout date is exclusive, so a
/// two-night stay yields exactly two dates.
pub fn stay_nights(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    let mut nights = Vec::new();
    let mut date = check_in;
    while date < check_out {
        nights.push(date);
        date = date.succ_opt().unwrap_or(date);
        if nights.last() == Some(&date) {
            break;
        }
    }
    nights
}

/// Sign of the occupancy change an event kind implies, or `None` when the
/// kind never touches the calendar.
pub fn booking_sign(kind: EventKind) -> Option<i32> {
    match kind {
        EventKind::Reservation | EventKind::Modification => Some(1),
        EventKind::Cancellation => Some(-1),
        _ => None,
    }
}

/// The ordered adjustments an event asks for.
///
/// A modification carrying the prior stay reverses it before applying the
/// new one, so a date or room move nets out correctly. When the adapter
/// attached no reservation details the raw payload is scanned for a stay
/// as a fallback.
pub fn plan_adjustments(event: &CanonicalEvent) -> Vec<StayAdjustment> {
    let Some(sign) = booking_sign(event.kind) else {
        return Vec::new();
    };

    let mut plan = Vec::new();

    if event.kind == EventKind::Modification {
        if let Some(prior) = &event.previous {
            plan.push(StayAdjustment {
                stay: prior.clone(),
                rooms: -prior.rooms,
            });
        }
    }

    let stay = event
        .reservation
        .as_ref()
        .map(|details| details.stay.clone())
        .or_else(|| StaySummary::from_payload(inner_object(&event.raw)));

    if let Some(stay) = stay {
        let rooms = sign * stay.rooms;
        plan.push(StayAdjustment { stay, rooms });
    }

    plan
}
