//! User activity events
//!
//! The UI shell publishes raw interactions here; the session manager's
//! listener task consumes them only while a session is authenticated.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

const ACTIVITY_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerDown,
    KeyDown,
    TouchStart,
    Scroll,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::PointerDown => "pointer_down",
            ActivityKind::KeyDown => "key_down",
            ActivityKind::TouchStart => "touch_start",
            ActivityKind::Scroll => "scroll",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub at: Instant,
}

#[derive(Clone)]
pub struct ActivityBus {
    tx: broadcast::Sender<ActivityEvent>,
}

impl ActivityBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(ACTIVITY_CAPACITY);
        Self { tx }
    }

    /// Publish an interaction stamped with the current instant
    pub fn publish(&self, kind: ActivityKind) {
        self.publish_at(kind, Instant::now());
    }

    pub fn publish_at(&self, kind: ActivityKind, at: Instant) {
        // No receiver means no authenticated session is listening
        let _ = self.tx.send(ActivityEvent { kind, at });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ActivityBus {
    fn default() -> Self {
        Self::new()
    }
}
