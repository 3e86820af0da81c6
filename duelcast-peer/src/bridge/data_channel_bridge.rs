use crate::bridge::{AppInbox, DeclaredCard};
use crate::signaling::Outbox;
use duelcast_core::{CardDeclaration, ConnectionError, ConnectionState, Result, SignalEnvelope};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Application messages riding on the signaling relay.
///
/// Sending is gated on the connection being usable; receiving is not.
#[derive(Clone)]
pub struct DataChannelBridge {
    outbox: Outbox,
    state: watch::Receiver<ConnectionState>,
    inbox: AppInbox,
}

impl DataChannelBridge {
    pub fn new(outbox: Outbox, state: watch::Receiver<ConnectionState>, inbox: AppInbox) -> Self {
        Self {
            outbox,
            state,
            inbox,
        }
    }

    pub async fn send(&self, card: CardDeclaration) -> Result<()> {
        let state = *self.state.borrow();
        if state != ConnectionState::Connected {
            return Err(ConnectionError::ChannelNotReady(state));
        }

        self.inbox.record_local(card.clone());
        self.outbox.send(SignalEnvelope::AppMessage(card)).await;
        Ok(())
    }

    /// Inbound messages from now on, in receipt order.
    pub fn subscribe(&self) -> broadcast::Receiver<CardDeclaration> {
        self.inbox.subscribe()
    }

    /// Runs `callback` for every inbound message until the connection is
    /// dropped. A slow callback delays its own messages but never loses any.
    pub fn on_receive<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(CardDeclaration) + Send + 'static,
    {
        let mut feed = self.inbox.register_callback();
        tokio::spawn(async move {
            while let Some(card) = feed.recv().await {
                callback(card);
            }
        })
    }

    pub fn declarations(&self) -> Vec<DeclaredCard> {
        self.inbox.declarations()
    }

    pub fn latest_received(&self) -> Option<CardDeclaration> {
        self.inbox.latest_received()
    }
}
