use duelcast_core::IceServerConfig;

/// Capacity of the channel carrying transport events to the negotiation loop.
pub const TRANSPORT_EVENT_CAPACITY: usize = 256;

/// WebRTC settings (STUN/TURN).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl TransportConfig {
    /// No ICE servers at all; host candidates only. Enough for loopback.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::defaults(),
        }
    }
}
