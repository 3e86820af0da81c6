use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    AwaitingRemote,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// No further negotiation happens in `Failed` or `Closed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingRemote => "awaiting-remote",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which side of the tie-break an instance ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationRole {
    #[default]
    Undecided,
    Offerer,
    Answerer,
}

/// Remote media made available to the UI once the connection is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStream<T> {
    pub tracks: Vec<T>,
}

impl<T> RemoteStream<T> {
    pub fn new(tracks: Vec<T>) -> Self {
        Self { tracks }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
