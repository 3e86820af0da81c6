use crate::bridge::{DeclarationLog, DeclarationOrigin, DeclaredCard};
use duelcast_core::CardDeclaration;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// How far a [`subscribe`](AppInbox::subscribe) receiver may fall behind
/// before it starts missing messages. Callbacks are not bounded.
pub const APP_MESSAGE_CAPACITY: usize = 64;

/// Fan-out point for application messages, shared by the negotiation actor
/// (which delivers) and the bridge (which hands out receivers).
#[derive(Clone)]
pub struct AppInbox {
    tx: broadcast::Sender<CardDeclaration>,
    callbacks: Arc<Mutex<Vec<mpsc::UnboundedSender<CardDeclaration>>>>,
    log: Arc<Mutex<DeclarationLog>>,
}

impl AppInbox {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(APP_MESSAGE_CAPACITY);
        Self {
            tx,
            callbacks: Arc::new(Mutex::new(Vec::new())),
            log: Arc::new(Mutex::new(DeclarationLog::new())),
        }
    }

    /// Every inbound message reaches subscribers, redeliveries included.
    pub fn deliver(&self, card: CardDeclaration) {
        debug!("<- card-declared {:?}", card.name);
        self.log.lock().record(card.clone(), DeclarationOrigin::Remote);
        self.callbacks
            .lock()
            .retain(|callback| callback.send(card.clone()).is_ok());
        let _ = self.tx.send(card);
    }

    /// Lossless feed for one callback; ends once the inbox is dropped.
    pub fn register_callback(&self) -> mpsc::UnboundedReceiver<CardDeclaration> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.callbacks.lock().push(tx);
        rx
    }

    pub fn record_local(&self, card: CardDeclaration) {
        self.log.lock().record(card, DeclarationOrigin::Local);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CardDeclaration> {
        self.tx.subscribe()
    }

    pub fn declarations(&self) -> Vec<DeclaredCard> {
        self.log.lock().entries()
    }

    pub fn latest_received(&self) -> Option<CardDeclaration> {
        self.log.lock().latest_received().cloned()
    }
}

impl Default for AppInbox {
    fn default() -> Self {
        Self::new()
    }
}
