use crate::model::{ConnectionState, RoomId};
use thiserror::Error;

/// Every failure the connection core can report.
///
/// Per-envelope failures (`CandidateApplyFailed`, `DescriptionApplyFailed`,
/// `DeliveryUnknown`) are only ever logged; they never abort processing of the
/// envelopes that follow. Structural failures are returned to the caller.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("already subscribed to room {0}")]
    AlreadySubscribed(RoomId),

    #[error("invalid room id {0:?}")]
    InvalidRoom(String),

    #[error("app channel not ready (connection is {0})")]
    ChannelNotReady(ConnectionState),

    #[error("delivery unknown: {0}")]
    DeliveryUnknown(String),

    #[error("failed to apply ICE candidate: {0}")]
    CandidateApplyFailed(String),

    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    #[error("failed to apply session description: {0}")]
    DescriptionApplyFailed(String),

    #[error("transport setup failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T, E = ConnectionError> = std::result::Result<T, E>;
