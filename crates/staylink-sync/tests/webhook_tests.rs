//! Inbound webhook processing: canonicalization, occupancy application,
//! room resolution and real-time push-back.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;
use staylink_channel::events::{CanonicalEvent, EventKind, ReservationDetails, StaySummary};
use staylink_db::models::{
    AvailabilityStatus, ChannelType, IntegrationStatus, SyncDirection, SyncOperation, SyncStatus,
};
use support::{
    active_integration, availability_row, date, engine_with, mapping_row, MockAdapter, MockStore,
};

fn stay(room: &str, check_in: &str, check_out: &str, rooms: i32) -> StaySummary {
    StaySummary {
        channel_room_code: room.to_string(),
        check_in: date(check_in),
        check_out: date(check_out),
        rooms,
    }
}

#[tokio::test]
async fn reservation_takes_rooms_for_every_stay_night() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    for day in ["2025-02-10", "2025-02-11", "2025-02-12"] {
        store.insert_availability(availability_row(integration.id, 7, date(day), 10, 2));
    }

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking_created",
        "data": {
            "booking_id": "BK-1001",
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-12",
            "rooms": 1
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.direction, SyncDirection::Inbound);
    assert_eq!(log.operation, SyncOperation::BookingCreate);
    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(log.records_processed, 2);
    assert_eq!(log.records_success, 2);
    assert_eq!(log.request_data, Some(payload));
    let event = log.response_data.unwrap();
    assert_eq!(event["kind"], "reservation");

    // Two stay nights change, checkout day does not.
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 3);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-11")), 3);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-12")), 2);

    let rows = store.availability.lock().unwrap().clone();
    let first = rows.iter().find(|r| r.date == date("2025-02-10")).unwrap();
    assert_eq!(first.available_rooms, 7);
    assert!(!first.is_synced);
}

#[tokio::test]
async fn cancellation_releases_the_booked_rooms() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    for day in ["2025-02-10", "2025-02-11"] {
        store.insert_availability(availability_row(integration.id, 7, date(day), 10, 3));
    }

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking.cancelled",
        "data": {
            "room_type_id": "DLX-1",
            "check_in": "2025-02-10",
            "check_out": "2025-02-12",
            "rooms": 1
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.operation, SyncOperation::BookingCancel);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 2);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-11")), 2);
}

#[tokio::test]
async fn booking_then_cancellation_restores_occupancy() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    for day in ["2025-02-10", "2025-02-11"] {
        store.insert_availability(availability_row(integration.id, 7, date(day), 10, 2));
    }

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let booking = json!({
        "event": "reservation",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-12",
            "rooms": 2
        }
    });
    engine.handle_webhook(&integration, &booking).await.unwrap();
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 4);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-11")), 4);

    let cancel = json!({
        "event": "cancellation",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-12",
            "rooms": 2
        }
    });
    engine.handle_webhook(&integration, &cancel).await.unwrap();

    let rows = store.availability.lock().unwrap().clone();
    for day in ["2025-02-10", "2025-02-11"] {
        let row = rows.iter().find(|r| r.date == date(day)).unwrap();
        assert_eq!(row.occupied_rooms, 2);
        assert_eq!(row.available_rooms, 8);
        assert_eq!(row.status, AvailabilityStatus::Available);
    }
}

#[tokio::test]
async fn occupancy_clamps_at_zero_and_at_capacity() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 9));
    store.insert_availability(availability_row(integration.id, 7, date("2025-03-01"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    // Oversized booking saturates at total capacity.
    let booking = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-11",
            "rooms": 4
        }
    });
    engine.handle_webhook(&integration, &booking).await.unwrap();
    let row = store
        .availability
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.date == date("2025-02-10"))
        .cloned()
        .unwrap();
    assert_eq!(row.occupied_rooms, 10);
    assert_eq!(row.available_rooms, 0);
    assert_eq!(row.status, AvailabilityStatus::Occupied);

    // Oversized cancellation floors at zero.
    let cancel = json!({
        "event": "cancel",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-03-01",
            "checkOut": "2025-03-02",
            "rooms": 5
        }
    });
    engine.handle_webhook(&integration, &cancel).await.unwrap();
    let row = store
        .availability
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.date == date("2025-03-01"))
        .cloned()
        .unwrap();
    assert_eq!(row.occupied_rooms, 0);
    assert_eq!(row.available_rooms, 10);
    assert_eq!(row.status, AvailabilityStatus::Available);
}

#[tokio::test]
async fn unmapped_room_reference_skips_without_failing() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "UNKNOWN-9",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-11"
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(log.records_processed, 0);
    assert_eq!(store.set_occupancy_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 2);
}

#[tokio::test]
async fn numeric_room_reference_resolves_without_a_mapping() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": 7,
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-11"
        }
    });
    engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 3);
}

#[tokio::test]
async fn mapping_takes_precedence_over_numeric_fallback() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    // Channel-side code "7" maps to internal room type 9, not 7.
    store.insert_mapping(mapping_row(integration.id, 9, "7"));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));
    store.insert_availability(availability_row(integration.id, 9, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "7",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-11"
        }
    });
    engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(store.occupied_on(integration.id, 9, date("2025-02-10")), 3);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 2);
}

#[tokio::test]
async fn modification_reverses_the_prior_stay_before_applying() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    store.insert_mapping(mapping_row(integration.id, 9, "STE-2"));
    for day in ["2025-02-10", "2025-02-11"] {
        store.insert_availability(availability_row(integration.id, 7, date(day), 10, 5));
    }
    for day in ["2025-03-01", "2025-03-02"] {
        store.insert_availability(availability_row(integration.id, 9, date(day), 10, 0));
    }

    // The guest moved rooms and dates: two deluxe rooms become one suite.
    let event = CanonicalEvent::new(EventKind::Modification, json!({}))
        .with_reservation(ReservationDetails::stay_only(stay(
            "STE-2",
            "2025-03-01",
            "2025-03-03",
            1,
        )))
        .with_previous(stay("DLX-1", "2025-02-10", "2025-02-12", 2));
    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom).with_event(event));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({"event": "booking.modified"});
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.operation, SyncOperation::BookingUpdate);
    assert_eq!(log.records_processed, 4);
    assert_eq!(log.records_success, 4);

    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 3);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-11")), 3);
    assert_eq!(store.occupied_on(integration.id, 9, date("2025-03-01")), 1);
    assert_eq!(store.occupied_on(integration.id, 9, date("2025-03-02")), 1);
}

#[tokio::test]
async fn real_time_integrations_push_changed_rows_back() {
    let store = Arc::new(MockStore::new());
    let mut integration = active_integration();
    integration.is_real_time_sync = true;
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    for day in ["2025-02-10", "2025-02-11"] {
        store.insert_availability(availability_row(integration.id, 7, date(day), 10, 2));
    }

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter.clone());

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-12"
        }
    });
    engine.handle_webhook(&integration, &payload).await.unwrap();

    let pushed = adapter.pushed_dates.lock().unwrap().clone();
    assert!(pushed.contains(&(7, date("2025-02-10"))));
    assert!(pushed.contains(&(7, date("2025-02-11"))));
}

#[tokio::test]
async fn failed_push_back_does_not_fail_the_webhook() {
    let store = Arc::new(MockStore::new());
    let mut integration = active_integration();
    integration.is_real_time_sync = true;
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom).with_failing_availability_push());
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-11"
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    // The calendar update stands even though the echo to the channel failed.
    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 3);
}

#[tokio::test]
async fn nights_without_calendar_rows_are_skipped() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-12"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-10",
            "checkOut": "2025-02-13"
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.records_processed, 3);
    assert_eq!(log.records_success, 2);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 3);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-12")), 3);
}

#[tokio::test]
async fn inverted_date_range_is_ignored() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_mapping(mapping_row(integration.id, 7, "DLX-1"));
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({
        "event": "booking",
        "data": {
            "roomTypeId": "DLX-1",
            "checkIn": "2025-02-12",
            "checkOut": "2025-02-10"
        }
    });
    let log = engine.handle_webhook(&integration, &payload).await.unwrap();

    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(log.records_processed, 0);
    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 2);
}

#[tokio::test]
async fn non_booking_events_are_logged_without_calendar_changes() {
    let store = Arc::new(MockStore::new());
    let integration = active_integration();
    store.insert_integration(integration.clone());
    store.insert_availability(availability_row(integration.id, 7, date("2025-02-10"), 10, 2));

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let review = json!({"event": "guest.review", "rating": 4});
    let log = engine.handle_webhook(&integration, &review).await.unwrap();
    assert_eq!(log.status, SyncStatus::Success);
    assert_eq!(log.records_processed, 0);
    let event = log.response_data.unwrap();
    assert_eq!(event["kind"], "review");

    let mystery = json!({"hello": "world"});
    let log = engine.handle_webhook(&integration, &mystery).await.unwrap();
    assert_eq!(log.status, SyncStatus::Success);
    let event = log.response_data.unwrap();
    assert_eq!(event["kind"], "unknown");

    assert_eq!(store.occupied_on(integration.id, 7, date("2025-02-10")), 2);
}

#[tokio::test]
async fn webhook_for_unregistered_channel_fails_the_log_only() {
    let store = Arc::new(MockStore::new());
    let mut integration = active_integration();
    integration.channel_type = ChannelType::Expedia;
    store.insert_integration(integration.clone());

    let adapter = Arc::new(MockAdapter::new(ChannelType::Custom));
    let engine = engine_with(store.clone(), adapter);

    let payload = json!({"event": "booking"});
    let err = engine
        .handle_webhook(&integration, &payload)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_CHANNEL");

    let log = store.latest_log();
    assert_eq!(log.status, SyncStatus::Failed);
    assert_eq!(log.error_code.as_deref(), Some("UNSUPPORTED_CHANNEL"));

    // Inbound failures never flip the integration into error status.
    let refreshed = store.integration_by_id(integration.id);
    assert_eq!(refreshed.status, IntegrationStatus::Active);
}
