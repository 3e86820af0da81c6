use async_trait::async_trait;
use duelcast_core::{Result, RoomId, SignalEnvelope};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Identifies one live subscription of a channel to a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    room: RoomId,
    id: u64,
}

impl SubscriptionHandle {
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            id: NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// What a subscriber observes on the relay, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// The relay confirmed the subscription is live; sending is safe from now on.
    Subscribed,

    Envelope(SignalEnvelope),

    /// The relay went away. Nothing else will arrive on this subscription.
    Closed,
}

pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub events: mpsc::UnboundedReceiver<RelayEvent>,
}

/// Ordered broadcast pub/sub bound to a room.
///
/// Delivery is at-least-once per subscriber and follows each sender's send
/// order; nothing is guaranteed across senders.
#[async_trait]
pub trait SignalingChannel: Send + Sync + 'static {
    /// Fails with `AlreadySubscribed` if this channel already holds a live
    /// subscription to `room`.
    async fn subscribe(&self, room: &RoomId) -> Result<Subscription>;

    /// Fire-and-forget. The relay never confirms delivery, failures are only
    /// logged as `DeliveryUnknown`.
    async fn send(&self, handle: &SubscriptionHandle, envelope: SignalEnvelope);

    /// Safe to call any number of times.
    async fn unsubscribe(&self, handle: &SubscriptionHandle);
}
