//! In-process event bus for credential and verification events.
//!
//! Subscribers are components of the same process; nothing here leaves it.
//! Delivery is best effort: a subscriber that falls behind by more than the
//! channel capacity skips the oldest events, which may include
//! [`CoreEvent::CredentialCleared`]. Consumers that gate decrypted content on
//! these events must check [`Subscription::missed`] and, when it grew,
//! re-read the current credential from the key cache instead of trusting the
//! last event they saw.

use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::keycache::Credential;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CredentialInstalled,
    CredentialCleared,
    ChallengeReceived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A credential became available. Carries a handle to the live secret.
    CredentialInstalled(Credential),
    CredentialCleared,
    /// Verification code taken from an inbound challenge SMS.
    ChallengeReceived(String),
}

impl CoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::CredentialInstalled(_) => EventKind::CredentialInstalled,
            CoreEvent::CredentialCleared => EventKind::CredentialCleared,
            CoreEvent::ChallengeReceived(_) => EventKind::ChallengeReceived,
        }
    }
}

impl std::fmt::Display for CoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreEvent::CredentialInstalled(_) => write!(f, "credential installed"),
            CoreEvent::CredentialCleared => write!(f, "credential cleared"),
            CoreEvent::ChallengeReceived(_) => write!(f, "challenge received"),
        }
    }
}

/// Typed publish/subscribe channel shared by the core components.
///
/// Each subscriber buffers at most `capacity` events; older ones are
/// dropped for that subscriber and counted in [`Subscription::missed`].
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event; returns the number of subscribers it reached.
    pub fn publish(&self, event: CoreEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!("[publish] no subscribers for {event}");
                0
            }
        }
    }

    /// Subscribe to a single kind of event.
    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            kind: Some(kind),
            missed: 0,
        }
    }

    pub fn subscribe_all(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            kind: None,
            missed: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving end of the bus, optionally filtered to one [`EventKind`].
pub struct Subscription {
    rx: broadcast::Receiver<CoreEvent>,
    kind: Option<EventKind>,
    missed: u64,
}

impl Subscription {
    /// Events of any kind dropped because this subscriber fell behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.kind.map_or(true, |kind| event.kind() == kind)
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<CoreEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    self.missed += skipped;
                    warn!("[recv] subscriber lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<CoreEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    self.missed += skipped;
                    warn!("[try_recv] subscriber lagged, skipped {skipped} events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_filters_by_kind() {
        let bus = EventBus::default();
        let mut challenges = bus.subscribe(EventKind::ChallengeReceived);
        let mut everything = bus.subscribe_all();

        assert_eq!(bus.publish(CoreEvent::CredentialCleared), 2);
        bus.publish(CoreEvent::ChallengeReceived("1234567".into()));

        assert_eq!(
            challenges.recv().await,
            Some(CoreEvent::ChallengeReceived("1234567".into()))
        );
        assert_eq!(everything.try_recv(), Some(CoreEvent::CredentialCleared));
        assert_eq!(
            everything.try_recv().map(|e| e.kind()),
            Some(EventKind::ChallengeReceived)
        );
        assert_eq!(everything.try_recv(), None);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(CoreEvent::CredentialCleared), 0);
    }

    #[test]
    fn test_lagged_subscriber_keeps_newest() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe_all();
        for code in ["1", "2", "3"] {
            bus.publish(CoreEvent::ChallengeReceived(code.into()));
        }
        assert_eq!(sub.try_recv(), Some(CoreEvent::ChallengeReceived("2".into())));
        assert_eq!(sub.try_recv(), Some(CoreEvent::ChallengeReceived("3".into())));
        assert_eq!(sub.missed(), 1);
    }

    #[test]
    fn test_lagged_subscriber_can_lose_credential_cleared() {
        let bus = EventBus::new(2);
        let mut cleared = bus.subscribe(EventKind::CredentialCleared);
        bus.publish(CoreEvent::CredentialCleared);
        bus.publish(CoreEvent::ChallengeReceived("1".into()));
        bus.publish(CoreEvent::ChallengeReceived("2".into()));

        assert_eq!(cleared.try_recv(), None);
        assert_eq!(cleared.missed(), 1);
    }
}
