//! Session signal bus
//!
//! The transport raises `SessionSignal::Expired` whenever a call observes
//! that the backend revoked the session, independent of the liveness poll.

use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Expired,
}

#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<SessionSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    /// Returns the number of subscribers that received the signal
    pub fn emit_expired(&self) -> usize {
        self.tx.send(SessionSignal::Expired).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let bus = SignalBus::new();
        assert_eq!(bus.emit_expired(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_expiry() {
        let bus = SignalBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.emit_expired(), 1);
        assert_eq!(rx.recv().await.unwrap(), SessionSignal::Expired);
    }
}
