mod app_inbox;
mod data_channel_bridge;
mod declaration_log;

pub use app_inbox::*;
pub use data_channel_bridge::*;
pub use declaration_log::*;
