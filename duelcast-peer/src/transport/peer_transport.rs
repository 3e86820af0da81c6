use anyhow::Result;
use async_trait::async_trait;
use duelcast_core::{NetworkCandidate, SessionDescription};
use tokio::sync::mpsc;

use crate::transport::TransportEvent;

/// The ICE-capable connection primitive the negotiation core drives.
///
/// Implementations report gathered candidates, remote tracks and connectivity
/// changes on the event channel they were created with.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Handle to a remote media track, handed to the UI as is.
    type RemoteTrack: Clone + Send + Sync + 'static;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: NetworkCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

pub type RemoteTrackOf<F> = <<F as TransportFactory>::Transport as PeerTransport>::RemoteTrack;

/// Builds one transport per connection attempt.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    type Transport: PeerTransport;

    /// Local media handle. `None` at connect time means receive-only.
    type LocalTrack: Send + 'static;

    async fn connect(
        &self,
        local_media: Option<Vec<Self::LocalTrack>>,
        events: mpsc::Sender<TransportEvent<<Self::Transport as PeerTransport>::RemoteTrack>>,
    ) -> Result<Self::Transport>;
}
