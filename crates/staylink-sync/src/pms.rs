//! Forwarding of guest records to the property-management system.
//!
//! Deliveries go through a bounded in-process queue drained by a
//! background worker, so webhook handling never blocks on the PMS.
//! Transient failures are retried with exponential backoff; permanent
//! rejections and overflow are logged and dropped.

use std::time::{Duration, Instant};

use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

use staylink_channel::events::GuestRecord;

use crate::config::PmsConfig;

/// One guest record queued for delivery, with the hotel context the PMS
/// needs to file it.
#[derive(Debug, Clone)]
pub struct GuestForward {
    pub hotel_id: i64,
    pub roomtype_id: Option<i64>,
    pub guest: GuestRecord,
}

/// Handle for enqueueing guest records. Cheap to clone and share.
pub struct PmsForwarder {
    sender: Option<mpsc::Sender<GuestForward>>,
}

impl PmsForwarder {
    /// Start the forwarder. Spawns the delivery worker when forwarding is
    /// enabled and an endpoint is configured; otherwise every enqueue is
    /// a no-op.
    pub fn spawn(config: PmsConfig) -> Self {
        if !config.enabled {
            info!("PMS forwarding disabled");
            return Self { sender: None };
        }
        let Some(endpoint) = config.endpoint.clone().filter(|e| !e.trim().is_empty()) else {
            warn!("PMS forwarding enabled without an endpoint, disabling");
            return Self { sender: None };
        };

        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("staylink-sync")
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                error!(error = %err, "could not build HTTP client, PMS forwarding disabled");
                return Self { sender: None };
            }
        };

        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = PmsWorker {
            endpoint,
            api_key: config.api_key,
            max_attempts: config.max_attempts.max(1),
            retry_backoff_ms: config.retry_backoff_ms,
            http,
        };
        tokio::spawn(worker.run(receiver));

        Self {
            sender: Some(sender),
        }
    }

    /// A forwarder that drops everything. Used when forwarding is off.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a guest record for delivery. Never blocks: a full queue
    /// drops the record with a warning.
    pub fn enqueue(&self, forward: GuestForward) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(forward) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    hotel_id = dropped.hotel_id,
                    "PMS forward queue full, dropping guest record"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(
                    hotel_id = dropped.hotel_id,
                    "PMS forward worker stopped, dropping guest record"
                );
            }
        }
    }
}

struct PmsWorker {
    endpoint: String,
    api_key: Option<String>,
    max_attempts: u32,
    retry_backoff_ms: u64,
    http: reqwest::Client,
}

impl PmsWorker {
    async fn run(self, mut receiver: mpsc::Receiver<GuestForward>) {
        info!(endpoint = %self.endpoint, "PMS forward worker started");
        while let Some(forward) = receiver.recv().await {
            self.deliver(forward).await;
        }
        info!("PMS forward worker stopped");
    }

    async fn deliver(&self, forward: GuestForward) {
        let mut payload = match serde_json::to_value(&forward.guest) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "could not serialize guest record, dropping");
                return;
            }
        };
        if let JsonValue::Object(map) = &mut payload {
            map.insert("hotel_id".to_string(), json!(forward.hotel_id));
            if let Some(roomtype_id) = forward.roomtype_id {
                map.insert("roomtype_id".to_string(), json!(roomtype_id));
            }
        }

        let url = resolve_endpoint(&self.endpoint, forward.hotel_id);
        let started = Instant::now();

        for attempt in 1..=self.max_attempts {
            let mut request = self.http.post(&url).json(&payload);
            if let Some(api_key) = &self.api_key {
                request = request.header("X-API-Key", api_key);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        hotel_id = forward.hotel_id,
                        attempt,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "guest record forwarded to PMS"
                    );
                    return;
                }
                Ok(response) => {
                    let status = response.status();
                    let transient = status.is_server_error() || status.as_u16() == 429;
                    if transient && attempt < self.max_attempts {
                        warn!(
                            hotel_id = forward.hotel_id,
                            status = status.as_u16(),
                            attempt,
                            "PMS returned an error, will retry"
                        );
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        let snippet: String = body.trim().chars().take(256).collect();
                        warn!(
                            hotel_id = forward.hotel_id,
                            status = status.as_u16(),
                            body = %snippet,
                            "PMS rejected guest record, dropping"
                        );
                        return;
                    }
                }
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if transient && attempt < self.max_attempts {
                        warn!(
                            hotel_id = forward.hotel_id,
                            error = %err,
                            attempt,
                            "PMS request failed, will retry"
                        );
                    } else {
                        warn!(
                            hotel_id = forward.hotel_id,
                            error = %err,
                            "PMS request failed, dropping guest record"
                        );
                        return;
                    }
                }
            }

            let backoff = self
                .retry_backoff_ms
                .saturating_mul(1_u64 << (attempt - 1).min(10));
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }
    }
}

/// Fill the endpoint template for one hotel. A `{hotelId}` placeholder is
/// substituted in place; without one the id is appended as a query
/// parameter.
fn resolve_endpoint(template: &str, hotel_id: i64) -> String {
    if template.contains("{hotelId}") {
        return template.replace("{hotelId}", &hotel_id.to_string());
    }
    let separator = if template.contains('?') { '&' } else { '?' };
    format!("{template}{separator}hotelId={hotel_id}")
}
