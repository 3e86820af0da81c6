
use duelcast_core::{ConnectionState, PeerIdentity};
use duelcast_peer::{ConnectionFacade, ConnectionHandle, LocalRelay};
use std::sync::Arc;
use tracing::Level;

use crate::utils::{MockTrack, MockTransportFactory, SIGNAL_TIMEOUT_MS, wait_for_state};

pub const ROOM: &str = "duel-42";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Opens a connection with a fixed identity on its own relay endpoint.
pub async fn open_mock_peer(
    relay: &LocalRelay,
    id: &str,
    name: &str,
) -> (ConnectionHandle<MockTrack>, MockTransportFactory) {
    let factory = MockTransportFactory::new(id);
    let handle = open_with_factory(relay, factory.clone(), id, name).await;
    (handle, factory)
}

pub async fn open_with_factory(
    relay: &LocalRelay,
    factory: MockTransportFactory,
    id: &str,
    name: &str,
) -> ConnectionHandle<MockTrack> {
    let facade = ConnectionFacade::new(Arc::new(relay.channel()), factory);
    match facade
        .open_with_identity(ROOM, None, PeerIdentity::new(id, name))
        .await
    {
        Ok(handle) => handle,
        Err(e) => panic!("failed to open {id}: {e}"),
    }
}

pub async fn wait_connected<T>(handles: &[&ConnectionHandle<T>]) {
    for handle in handles {
        wait_for_state(&mut handle.state(), ConnectionState::Connected, SIGNAL_TIMEOUT_MS)
            .await
            .expect("connection not established");
    }
}
