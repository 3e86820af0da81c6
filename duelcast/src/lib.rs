pub use duelcast_core::{ConnectionError, PeerId, PeerIdentity, Result, RoomId};

pub mod model {
    pub use duelcast_core::model::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use duelcast_peer::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use duelcast_relay::*;
}
