mod local_relay;
mod outbox;
mod signaling_channel;
mod ws_channel;

pub use local_relay::*;
pub use outbox::*;
pub use signaling_channel::*;
pub use ws_channel::*;
