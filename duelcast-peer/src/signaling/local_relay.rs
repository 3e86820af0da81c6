use crate::signaling::{RelayEvent, SignalingChannel, Subscription, SubscriptionHandle};
use async_trait::async_trait;
use dashmap::DashMap;
use duelcast_core::{ConnectionError, Result, RoomId, SignalEnvelope};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Member {
    subscription: u64,
    tx: mpsc::UnboundedSender<RelayEvent>,
}

/// In-process broadcast relay.
///
/// Every [`LocalSignalingChannel`] created from the same relay behaves like a
/// separate process connected to one hosted broadcast service: messages go to
/// every other subscriber of the room, never back to the sender.
#[derive(Clone, Default)]
pub struct LocalRelay {
    rooms: Arc<DashMap<RoomId, Vec<Member>>>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new endpoint on this relay.
    pub fn channel(&self) -> LocalSignalingChannel {
        LocalSignalingChannel {
            relay: self.clone(),
            subscribed: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    fn join(&self, room: &RoomId, subscription: u64) -> mpsc::UnboundedReceiver<RelayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Confirmation is queued ahead of anything broadcast to the member.
        let _ = tx.send(RelayEvent::Subscribed);
        self.rooms
            .entry(room.clone())
            .or_default()
            .push(Member { subscription, tx });
        rx
    }

    fn leave(&self, room: &RoomId, subscription: u64) {
        let now_empty = match self.rooms.get_mut(room) {
            Some(mut members) => {
                members.retain(|m| m.subscription != subscription);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
    }

    fn broadcast(&self, handle: &SubscriptionHandle, envelope: &SignalEnvelope) -> Result<usize> {
        let json = serde_json::to_string(envelope)?;

        let Some(mut members) = self.rooms.get_mut(handle.room()) else {
            return Err(ConnectionError::DeliveryUnknown(format!(
                "room {} has no subscribers",
                handle.room()
            )));
        };
        if !members.iter().any(|m| m.subscription == handle.id()) {
            return Err(ConnectionError::DeliveryUnknown(format!(
                "not subscribed to room {}",
                handle.room()
            )));
        }

        members.retain(|m| !m.tx.is_closed());

        let mut delivered = 0;
        for member in members.iter().filter(|m| m.subscription != handle.id()) {
            let copy: SignalEnvelope = serde_json::from_str(&json)?;
            if member.tx.send(RelayEvent::Envelope(copy)).is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}

/// One endpoint of a [`LocalRelay`].
pub struct LocalSignalingChannel {
    relay: LocalRelay,
    subscribed: Mutex<HashMap<RoomId, u64>>,
}

impl LocalSignalingChannel {
    pub fn relay(&self) -> &LocalRelay {
        &self.relay
    }
}

#[async_trait]
impl SignalingChannel for LocalSignalingChannel {
    async fn subscribe(&self, room: &RoomId) -> Result<Subscription> {
        let handle = {
            let mut subscribed = self.subscribed.lock();
            if subscribed.contains_key(room) {
                return Err(ConnectionError::AlreadySubscribed(room.clone()));
            }
            let handle = SubscriptionHandle::new(room.clone());
            subscribed.insert(room.clone(), handle.id());
            handle
        };

        debug!("Subscribed to {}", room.topic());
        let events = self.relay.join(room, handle.id());
        Ok(Subscription { handle, events })
    }

    async fn send(&self, handle: &SubscriptionHandle, envelope: SignalEnvelope) {
        match self.relay.broadcast(handle, &envelope) {
            Ok(n) => debug!("{} delivered to {} subscriber(s)", envelope.event(), n),
            Err(e) => warn!("Dropped {}: {}", envelope.event(), e),
        }
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let removed = {
            let mut subscribed = self.subscribed.lock();
            match subscribed.get(handle.room()) {
                Some(id) if *id == handle.id() => subscribed.remove(handle.room()).is_some(),
                _ => false,
            }
        };
        if removed {
            self.relay.leave(handle.room(), handle.id());
            debug!("Unsubscribed from {}", handle.room().topic());
        }
    }
}
