use axum::extract::ws::Message;
use dashmap::DashMap;
use duelcast_core::{RelayFrame, RoomId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

struct RelayInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<RoomId>>,
}

/// Room membership and fan-out for every open WebSocket.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                connections: DashMap::new(),
                rooms: DashMap::new(),
                memberships: DashMap::new(),
            }),
        }
    }

    pub fn add_connection(&self, id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(id, tx);
    }

    /// Drops the connection and every room membership it held.
    pub fn remove_connection(&self, id: &ConnectionId) {
        self.inner.connections.remove(id);

        let Some((_, rooms)) = self.inner.memberships.remove(id) else {
            return;
        };
        for room in rooms {
            self.forget_member(&room, id);
        }
    }

    pub fn member_count(&self, room: &RoomId) -> usize {
        self.inner.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    pub fn handle_frame(&self, id: ConnectionId, frame: RelayFrame) {
        match frame {
            RelayFrame::Join { room } => self.join(id, room),
            RelayFrame::Leave { room } => self.leave(id, &room),
            RelayFrame::Broadcast { room, message } => self.broadcast(id, room, message),
            RelayFrame::Subscribed { .. } | RelayFrame::Error { .. } => {
                warn!("Connection {} sent a server-only frame", id);
            }
        }
    }

    /// Joining twice is harmless; the confirmation is sent every time.
    fn join(&self, id: ConnectionId, room: RoomId) {
        self.inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(id);
        self.inner
            .memberships
            .entry(id)
            .or_default()
            .insert(room.clone());

        info!("Connection {} joined {}", id, room.topic());
        self.send_frame(&id, &RelayFrame::Subscribed { room });
    }

    fn leave(&self, id: ConnectionId, room: &RoomId) {
        if let Some(mut rooms) = self.inner.memberships.get_mut(&id) {
            rooms.remove(room);
        }
        self.forget_member(room, &id);
        info!("Connection {} left {}", id, room.topic());
    }

    fn broadcast(&self, sender: ConnectionId, room: RoomId, message: serde_json::Value) {
        let recipients: Vec<ConnectionId> = match self.inner.rooms.get(&room) {
            Some(members) if members.contains(&sender) => members
                .iter()
                .filter(|member| **member != sender)
                .copied()
                .collect(),
            _ => {
                self.send_frame(
                    &sender,
                    &RelayFrame::Error {
                        message: format!("not joined to {room}"),
                    },
                );
                return;
            }
        };

        let frame = RelayFrame::Broadcast { room, message };
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize relay frame: {}", e);
                return;
            }
        };

        debug!("Fan-out from {} to {} member(s)", sender, recipients.len());
        for member in recipients {
            self.send_text(&member, json.clone());
        }
    }

    pub fn send_frame(&self, id: &ConnectionId, frame: &RelayFrame) {
        match serde_json::to_string(frame) {
            Ok(json) => self.send_text(id, json),
            Err(e) => error!("Failed to serialize relay frame: {}", e),
        }
    }

    fn send_text(&self, id: &ConnectionId, json: String) {
        let Some(connection) = self.inner.connections.get(id) else {
            warn!("Attempted to send to disconnected connection {}", id);
            return;
        };
        if let Err(e) = connection.send(Message::Text(json.into())) {
            error!("Failed to queue WS message for {}: {:?}", id, e);
        }
    }

    fn forget_member(&self, room: &RoomId, id: &ConnectionId) {
        let now_empty = match self.inner.rooms.get_mut(room) {
            Some(mut members) => {
                members.remove(id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.inner.rooms.remove_if(room, |_, members| members.is_empty());
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
