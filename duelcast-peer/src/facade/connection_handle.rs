use crate::bridge::{DataChannelBridge, DeclaredCard};
use crate::negotiation::CloseSignal;
use duelcast_core::{CardDeclaration, ConnectionState, PeerIdentity, RemoteStream, Result, RoomId};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

/// A live connection attempt. Dropping it closes the connection.
pub struct ConnectionHandle<Track> {
    identity: PeerIdentity,
    room: RoomId,
    state: watch::Receiver<ConnectionState>,
    remote_name: watch::Receiver<Option<String>>,
    remote_stream: watch::Receiver<Option<RemoteStream<Track>>>,
    bridge: DataChannelBridge,
    close: CloseSignal,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<Track> ConnectionHandle<Track> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        identity: PeerIdentity,
        room: RoomId,
        state: watch::Receiver<ConnectionState>,
        remote_name: watch::Receiver<Option<String>>,
        remote_stream: watch::Receiver<Option<RemoteStream<Track>>>,
        bridge: DataChannelBridge,
        close: CloseSignal,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            identity,
            room,
            state,
            remote_name,
            remote_stream,
            bridge,
            close,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn remote_name(&self) -> watch::Receiver<Option<String>> {
        self.remote_name.clone()
    }

    /// Populated once the connection is up and the remote side sent media.
    pub fn remote_stream(&self) -> watch::Receiver<Option<RemoteStream<Track>>> {
        self.remote_stream.clone()
    }

    /// Fails with `ChannelNotReady` unless the connection is `Connected`.
    pub async fn send_app(&self, card: CardDeclaration) -> Result<()> {
        self.bridge.send(card).await
    }

    /// Invoked for each inbound card, in receipt order.
    pub fn on_app<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnMut(CardDeclaration) + Send + 'static,
    {
        self.bridge.on_receive(callback)
    }

    /// Receivers more than
    /// [`APP_MESSAGE_CAPACITY`](crate::bridge::APP_MESSAGE_CAPACITY) messages
    /// behind get `Lagged`; use [`on_app`](Self::on_app) to see every card.
    pub fn app_messages(&self) -> broadcast::Receiver<CardDeclaration> {
        self.bridge.subscribe()
    }

    pub fn declarations(&self) -> Vec<DeclaredCard> {
        self.bridge.declarations()
    }

    /// Newest card the remote side declared, redeliveries folded.
    pub fn latest_received(&self) -> Option<CardDeclaration> {
        self.bridge.latest_received()
    }

    pub fn local_identity(&self) -> &PeerIdentity {
        &self.identity
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Closes the connection and waits for teardown to finish.
    ///
    /// Later calls return immediately.
    pub async fn close(&self) {
        self.close.close();

        let task = self.task.lock().take();
        let Some(task) = task else {
            return;
        };
        if let Err(e) = task.await {
            warn!("Negotiation task for {} ended abnormally: {}", self.identity.id, e);
        }
    }
}

impl<Track> Drop for ConnectionHandle<Track> {
    fn drop(&mut self) {
        self.close.close();
    }
}
