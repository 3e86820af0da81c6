use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// Frames exchanged between a peer and the broadcast relay.
///
/// `message` is opaque to the relay; peers put a serialized
/// [`SignalEnvelope`](crate::SignalEnvelope) in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayFrame {
    Join {
        room: RoomId,
    },
    Leave {
        room: RoomId,
    },
    Broadcast {
        room: RoomId,
        message: serde_json::Value,
    },
    Subscribed {
        room: RoomId,
    },
    Error {
        message: String,
    },
}
