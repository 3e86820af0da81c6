use crate::signaling::{RelayEvent, SignalingChannel, Subscription, SubscriptionHandle};
use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duelcast_core::{ConnectionError, RelayFrame, Result, RoomId, SignalEnvelope};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

struct RoomEntry {
    subscription: u64,
    tx: mpsc::UnboundedSender<RelayEvent>,
}

type Rooms = Arc<DashMap<RoomId, RoomEntry>>;

/// [`SignalingChannel`] talking to a `duelcast-relay` server over one
/// WebSocket. Several rooms can share the socket.
///
/// Once the relay hangs up, every subscription sees `Closed` and further
/// subscribes fail with `Transport`.
pub struct WsSignalingChannel {
    outbound: mpsc::UnboundedSender<RelayFrame>,
    rooms: Rooms,
    disconnected: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WsSignalingChannel {
    pub async fn connect(relay_url: &str) -> Result<Self> {
        let url = Url::parse(relay_url)
            .with_context(|| format!("invalid relay url {relay_url}"))
            .map_err(ConnectionError::Transport)?;

        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to relay {url}"))
            .map_err(ConnectionError::Transport)?;
        info!("Connected to relay {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<RelayFrame>();
        let rooms: Rooms = Arc::new(DashMap::new());
        let disconnected = Arc::new(AtomicBool::new(false));

        let send_task = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize relay frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!("Relay socket write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let recv_rooms = rooms.clone();
        let recv_disconnected = disconnected.clone();
        let recv_task = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<RelayFrame>(text.as_str()) {
                            Ok(frame) => route_frame(&recv_rooms, frame),
                            Err(e) => warn!("Invalid relay frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay socket read failed: {}", e);
                        break;
                    }
                }
            }

            info!("Relay connection closed");
            recv_disconnected.store(true, Ordering::SeqCst);
            recv_rooms.retain(|_, entry| {
                let _ = entry.tx.send(RelayEvent::Closed);
                false
            });
        });

        Ok(Self {
            outbound,
            rooms,
            disconnected,
            tasks: Mutex::new(vec![send_task, recv_task]),
        })
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

fn relay_closed() -> ConnectionError {
    ConnectionError::Transport(anyhow::anyhow!("relay connection is closed"))
}

fn route_frame(rooms: &Rooms, frame: RelayFrame) {
    match frame {
        RelayFrame::Subscribed { room } => {
            if let Some(entry) = rooms.get(&room) {
                let _ = entry.tx.send(RelayEvent::Subscribed);
            }
        }
        RelayFrame::Broadcast { room, message } => {
            let Some(entry) = rooms.get(&room) else {
                debug!("Broadcast for unsubscribed room {}", room);
                return;
            };
            match serde_json::from_value::<SignalEnvelope>(message) {
                Ok(envelope) => {
                    let _ = entry.tx.send(RelayEvent::Envelope(envelope));
                }
                Err(e) => warn!("Skipping malformed envelope in {}: {}", room, e),
            }
        }
        RelayFrame::Error { message } => warn!("Relay error: {}", message),
        RelayFrame::Join { .. } | RelayFrame::Leave { .. } => {
            debug!("Ignoring client-side frame from relay");
        }
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn subscribe(&self, room: &RoomId) -> Result<Subscription> {
        if self.is_disconnected() {
            return Err(relay_closed());
        }
        let handle = SubscriptionHandle::new(room.clone());
        let (tx, events) = mpsc::unbounded_channel();

        match self.rooms.entry(room.clone()) {
            Entry::Occupied(_) => {
                return Err(ConnectionError::AlreadySubscribed(room.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(RoomEntry {
                    subscription: handle.id(),
                    tx,
                });
            }
        }

        // The reader may have cleared the rooms between the check above and
        // the insert.
        if self.is_disconnected()
            || self
                .outbound
                .send(RelayFrame::Join { room: room.clone() })
                .is_err()
        {
            self.rooms
                .remove_if(room, |_, entry| entry.subscription == handle.id());
            return Err(relay_closed());
        }

        Ok(Subscription { handle, events })
    }

    async fn send(&self, handle: &SubscriptionHandle, envelope: SignalEnvelope) {
        let event = envelope.event();
        let message = match serde_json::to_value(&envelope) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropped {}: {}", event, ConnectionError::from(e));
                return;
            }
        };
        let frame = RelayFrame::Broadcast {
            room: handle.room().clone(),
            message,
        };
        if self.outbound.send(frame).is_err() {
            let err = ConnectionError::DeliveryUnknown("relay connection is closed".into());
            warn!("Dropped {}: {}", event, err);
        }
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let removed = self
            .rooms
            .remove_if(handle.room(), |_, entry| entry.subscription == handle.id())
            .is_some();
        if removed {
            let _ = self.outbound.send(RelayFrame::Leave {
                room: handle.room().clone(),
            });
        }
    }
}

impl Drop for WsSignalingChannel {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
