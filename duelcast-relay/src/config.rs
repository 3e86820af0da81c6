use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "duelcast-relay", about = "Room broadcast relay for duelcast peers")]
pub struct RelayConfig {
    /// Address the WebSocket listener binds to.
    #[arg(long, env = "DUELCAST_RELAY_BIND", default_value = "0.0.0.0:8787")]
    pub bind: SocketAddr,

    /// Route serving the WebSocket upgrade.
    #[arg(long, env = "DUELCAST_RELAY_PATH", default_value = "/ws")]
    pub path: String,
}
