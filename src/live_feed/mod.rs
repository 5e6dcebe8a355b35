//! LiveFeed - Realtime Reading Distribution
//!
//! ## Responsibilities
//!
//! - Subscriber registration and teardown
//! - Fan-out of newly ingested readings to every subscriber
//! - Per-subscriber error signalling
//!
//! Publication is best-effort and not part of the ingestion success
//! contract. Each subscriber has a bounded queue; an event that does not
//! fit is dropped for that subscriber with a warning instead of stalling
//! ingestion. There is no backlog or replay for late subscribers.
//! Within one feed instance every subscriber observes published events
//! in the same order.

use crate::reading_store::Reading;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Feed event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "kebab-case")]
pub enum FeedMessage {
    /// A newly ingested reading, in its normalized stored form
    NewData(Reading),
    /// Failure signal for one subscriber (bad frame, storage failure)
    Error(FeedError),
}

/// Error event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedError {
    pub message: String,
}

/// Subscriber connection
struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<String>,
}

/// LiveFeed instance
pub struct LiveFeed {
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
    subscriber_count: AtomicU64,
    queue_capacity: usize,
}

impl LiveFeed {
    /// Create a feed with the given per-subscriber queue capacity
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            subscriber_count: AtomicU64::new(0),
            queue_capacity,
        }
    }

    /// Register a new subscriber
    pub async fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, Subscriber { id, tx });
        }

        self.subscriber_count.fetch_add(1, Ordering::Relaxed);
        tracing::info!(subscriber_id = %id, "Feed subscriber connected");

        (id, rx)
    }

    /// Unregister a subscriber
    pub async fn unregister(&self, id: &Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(id).is_some() {
            self.subscriber_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(subscriber_id = %id, "Feed subscriber disconnected");
        }
    }

    /// Deliver the message to every current subscriber.
    ///
    /// Infallible from the caller's perspective: serialization failures
    /// are logged and swallowed, full queues drop the event for that
    /// subscriber only.
    pub async fn publish(&self, message: FeedMessage) {
        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize feed message");
                return;
            }
        };

        let subscribers = self.subscribers.read().await;
        tracing::debug!(
            subscriber_count = subscribers.len(),
            "Publishing to feed subscribers"
        );

        for subscriber in subscribers.values() {
            match subscriber.tx.try_send(json.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber_id = %subscriber.id,
                        "Subscriber queue full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Cleaned up on unregister
                }
            }
        }
    }

    /// Deliver a message to one subscriber only
    pub async fn send_to(&self, id: &Uuid, message: FeedMessage) {
        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize feed message");
                return;
            }
        };

        let subscribers = self.subscribers.read().await;
        if let Some(subscriber) = subscribers.get(id) {
            if subscriber.tx.try_send(json).is_err() {
                tracing::warn!(subscriber_id = %id, "Failed to deliver message to subscriber");
            }
        }
    }

    /// Current subscriber count
    pub fn subscriber_count(&self) -> u64 {
        self.subscriber_count.load(Ordering::Relaxed)
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
