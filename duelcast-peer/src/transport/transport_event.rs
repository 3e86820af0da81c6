use duelcast_core::NetworkCandidate;

/// Connectivity as reported by the underlying peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events the transport emits for the negotiation loop.
#[derive(Debug, Clone)]
pub enum TransportEvent<T> {
    /// A local candidate was gathered and has to reach the remote side.
    CandidateDiscovered(NetworkCandidate),

    /// The remote side started sending a media track.
    TrackReceived(T),

    StateChanged(TransportState),
}
