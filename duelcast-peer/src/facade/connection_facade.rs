use crate::bridge::{AppInbox, DataChannelBridge};
use crate::facade::ConnectionHandle;
use crate::negotiation::{CloseSignal, NegotiationActor, NegotiationStateMachine};
use crate::signaling::{Outbox, SignalingChannel, Subscription};
use crate::transport::{
    RemoteTrackOf, TRANSPORT_EVENT_CAPACITY, TransportConfig, TransportFactory,
    WebRtcTransportFactory,
};
use duelcast_core::{ConnectionError, PeerIdentity, Result, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Entry point for the UI: one call per duel.
pub struct ConnectionFacade<F: TransportFactory> {
    signaling: Arc<dyn SignalingChannel>,
    factory: F,
}

impl ConnectionFacade<WebRtcTransportFactory> {
    pub fn webrtc(signaling: Arc<dyn SignalingChannel>, config: TransportConfig) -> Self {
        Self::new(signaling, WebRtcTransportFactory::new(config))
    }
}

impl<F: TransportFactory> ConnectionFacade<F> {
    pub fn new(signaling: Arc<dyn SignalingChannel>, factory: F) -> Self {
        Self { signaling, factory }
    }

    /// Joins `room_id` under a fresh identity and starts negotiating.
    ///
    /// Pass `None` as `local_media` to only receive.
    pub async fn open(
        &self,
        room_id: &str,
        local_media: Option<Vec<F::LocalTrack>>,
        display_name: impl Into<String>,
    ) -> Result<ConnectionHandle<RemoteTrackOf<F>>> {
        self.open_with_identity(room_id, local_media, PeerIdentity::generate(display_name))
            .await
    }

    pub async fn open_with_identity(
        &self,
        room_id: &str,
        local_media: Option<Vec<F::LocalTrack>>,
        identity: PeerIdentity,
    ) -> Result<ConnectionHandle<RemoteTrackOf<F>>> {
        let room = RoomId::parse(room_id)?;

        let Subscription { handle, events } = self.signaling.subscribe(&room).await?;
        let outbox = Outbox::new(self.signaling.clone(), handle);

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let transport = match self.factory.connect(local_media, transport_tx).await {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                warn!("Failed to create transport for {}: {:#}", room, e);
                outbox.release().await;
                return Err(ConnectionError::Transport(e));
            }
        };

        let (close, listener) = CloseSignal::new();
        let inbox = AppInbox::new();
        let machine = NegotiationStateMachine::new(
            identity.clone(),
            transport,
            outbox.clone(),
            listener.clone(),
            inbox.clone(),
        );

        let state = machine.watch_state();
        let remote_name = machine.watch_remote_name();
        let remote_stream = machine.watch_remote_stream();
        let bridge = DataChannelBridge::new(outbox, state.clone(), inbox);

        info!("Opening connection {} in {}", identity.id, room);
        let task = tokio::spawn(NegotiationActor::new(machine, events, transport_rx, listener).run());

        Ok(ConnectionHandle::new(
            identity,
            room,
            state,
            remote_name,
            remote_stream,
            bridge,
            close,
            task,
        ))
    }
}
