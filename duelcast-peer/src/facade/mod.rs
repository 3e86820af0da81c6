mod connection_facade;
mod connection_handle;

pub use connection_facade::*;
pub use connection_handle::*;
