mod bridge;
mod facade;
mod negotiation;
mod signaling;
mod transport;

pub use bridge::*;
pub use facade::*;
pub use negotiation::*;
pub use signaling::*;
pub use transport::*;
