mod card;
mod description;
mod envelope;
mod ice;
mod peer;
mod relay;
mod room;
mod state;

pub use card::CardDeclaration;
pub use description::{SdpKind, SessionDescription};
pub use envelope::{AnswerPayload, OfferPayload, ReadyPayload, SignalEnvelope};
pub use ice::{IceServerConfig, NetworkCandidate};
pub use peer::{PeerId, PeerIdentity};
pub use relay::RelayFrame;
pub use room::RoomId;
pub use state::{ConnectionState, NegotiationRole, RemoteStream};
