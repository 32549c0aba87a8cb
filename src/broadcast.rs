//! Dashboard event fan-out.
//!
//! A `Broadcaster` pushes `DashboardEvent`s to every live `Subscription`.
//! Each subscription owns a bounded channel. `publish` uses `try_send` and
//! never blocks: a subscriber whose buffer is full misses the event and the
//! drop is counted. Subscribers whose receiving end is gone are pruned on the
//! next publish.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ChannelError, RespireError, RespireResult};

/// Default per-subscriber buffer size.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new random subscriber id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of dashboard event.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TrafficUpdate,
    AqiUpdate,
    AlertUpdate,
    SimulationResult,
    Connection,
    Pong,
}

/// A message pushed to dashboard clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Event payload.
    pub data: serde_json::Value,
    /// Time the event was created.
    pub timestamp: DateTime<Utc>,
}

impl DashboardEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Greeting sent to a new subscriber.
    #[must_use]
    pub fn connection(subscriber: SubscriberId) -> Self {
        Self::new(
            EventKind::Connection,
            serde_json::json!({
                "status": "connected",
                "subscriberId": subscriber.to_string(),
            }),
        )
    }

    /// Reply to a client ping.
    #[must_use]
    pub fn pong() -> Self {
        Self::new(EventKind::Pong, serde_json::Value::Null)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Per-subscriber buffer capacity.
    pub capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    subscribers: Mutex<HashMap<SubscriberId, Sender<DashboardEvent>>>,
    dropped: AtomicU64,
}

impl Registry {
    fn remove(&self, id: SubscriberId) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.remove(&id);
        }
    }
}

/// Fan-out hub for dashboard events.
#[derive(Debug)]
pub struct Broadcaster {
    cfg: BroadcasterConfig,
    registry: Arc<Registry>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(BroadcasterConfig::default())
    }
}

impl Broadcaster {
    /// Creates a broadcaster.
    #[must_use]
    pub fn new(cfg: BroadcasterConfig) -> Self {
        Self {
            cfg,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Registers a new subscriber.
    ///
    /// The first event on the returned subscription is a `connection` event.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the subscriber table lock is poisoned.
    pub fn subscribe(&self) -> RespireResult<Subscription> {
        let id = SubscriberId::new();
        let (tx, rx) = bounded::<DashboardEvent>(self.cfg.capacity.max(1));

        // Capacity is at least one, so the greeting always fits.
        let _ = tx.try_send(DashboardEvent::connection(id));

        let mut subs = self
            .registry
            .subscribers
            .lock()
            .map_err(|_| RespireError::internal("poisoned lock: broadcaster.subscribe"))?;
        subs.insert(id, tx);
        debug!(subscriber = %id, total = subs.len(), "dashboard subscriber connected");

        Ok(Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
            unregistered: AtomicBool::new(false),
        })
    }

    /// Delivers `event` to every subscriber without blocking.
    ///
    /// Returns the number of subscribers that accepted the event.
    pub fn publish(&self, event: &DashboardEvent) -> usize {
        let Ok(mut subs) = self.registry.subscribers.lock() else {
            self.registry.dropped.fetch_add(1, Ordering::Relaxed);
            return 0;
        };

        let mut delivered = 0;
        let mut dropped = 0u64;
        subs.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(subscriber = %id, "pruned disconnected dashboard subscriber");
                false
            }
        });

        if dropped > 0 {
            self.registry.dropped.fetch_add(dropped, Ordering::Relaxed);
            warn!(kind = ?event.kind, dropped, "dashboard subscribers lagging; events dropped");
        }
        delivered
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.lock().map_or(0, |subs| subs.len())
    }

    /// Total events dropped because a subscriber's buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.registry.dropped.load(Ordering::Relaxed)
    }
}

/// A subscriber's end of the broadcaster.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: Receiver<DashboardEvent>,
    registry: Weak<Registry>,
    unregistered: AtomicBool,
}

impl Subscription {
    /// The subscriber id.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Explicit unregistration. Idempotent.
    pub fn unsubscribe(&self) {
        if self.unregistered.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    /// Receive the next event (blocking).
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Disconnected` once the broadcaster is gone and
    /// the buffer is drained.
    pub fn recv(&self) -> RespireResult<DashboardEvent> {
        self.rx.recv().map_err(|_| ChannelError::Disconnected.into())
    }

    /// Receive the next event with a timeout.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Timeout` or `ChannelError::Disconnected`.
    pub fn recv_timeout(&self, timeout: Duration) -> RespireResult<DashboardEvent> {
        self.rx.recv_timeout(timeout).map_err(|err| {
            match err {
                RecvTimeoutError::Timeout => ChannelError::Timeout {
                    duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                },
                RecvTimeoutError::Disconnected => ChannelError::Disconnected,
            }
            .into()
        })
    }

    /// Receive an event if one is buffered.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Disconnected` once the broadcaster is gone and
    /// the buffer is drained.
    pub fn try_recv(&self) -> RespireResult<Option<DashboardEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Disconnected.into()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
