use crate::signaling::{SignalingChannel, SubscriptionHandle};
use duelcast_core::SignalEnvelope;
use std::sync::Arc;
use tracing::debug;

/// Sending half of one subscription, shared by the state machine and the
/// app bridge.
#[derive(Clone)]
pub struct Outbox {
    channel: Arc<dyn SignalingChannel>,
    handle: SubscriptionHandle,
}

impl Outbox {
    pub fn new(channel: Arc<dyn SignalingChannel>, handle: SubscriptionHandle) -> Self {
        Self { channel, handle }
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    pub async fn send(&self, envelope: SignalEnvelope) {
        debug!("-> {} on {}", envelope.event(), self.handle.room());
        self.channel.send(&self.handle, envelope).await;
    }

    pub async fn release(&self) {
        self.channel.unsubscribe(&self.handle).await;
    }
}
