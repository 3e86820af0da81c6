use duelcast_core::{ConnectionError, ConnectionState, RoomId};
use duelcast_peer::{ConnectionFacade, LocalRelay, SignalingChannel};
use std::sync::Arc;

use crate::integration::{ROOM, init_tracing};
use crate::utils::{MockTransportFactory, SIGNAL_TIMEOUT_MS, wait_for_state};

#[tokio::test]
async fn test_empty_room_is_rejected() {
    init_tracing();

    let relay = LocalRelay::new();
    let facade = ConnectionFacade::new(Arc::new(relay.channel()), MockTransportFactory::new("a1"));

    for room in ["", "   "] {
        let Err(e) = facade.open(room, None, "Yugi").await else {
            panic!("room {room:?} must be rejected");
        };
        assert!(matches!(e, ConnectionError::InvalidRoom(_)));
    }
}

#[tokio::test]
async fn test_second_open_on_same_channel_fails() {
    init_tracing();

    let relay = LocalRelay::new();
    let channel: Arc<dyn SignalingChannel> = Arc::new(relay.channel());
    let facade = ConnectionFacade::new(channel, MockTransportFactory::new("a1"));

    let first = facade.open(ROOM, None, "Yugi").await.expect("first open");
    let Err(e) = facade.open(ROOM, None, "Yugi").await else {
        panic!("second subscription must fail");
    };
    assert!(matches!(e, ConnectionError::AlreadySubscribed(_)));

    // Once closed, the room can be joined again.
    first.close().await;
    let again = facade.open(ROOM, None, "Yugi").await.expect("reopen");
    wait_for_state(&mut again.state(), ConnectionState::AwaitingRemote, SIGNAL_TIMEOUT_MS)
        .await
        .expect("reopened connection not announced");
    again.close().await;
}

#[tokio::test]
async fn test_transport_failure_releases_subscription() {
    init_tracing();

    let relay = LocalRelay::new();
    let facade = ConnectionFacade::new(
        Arc::new(relay.channel()),
        MockTransportFactory::new("a1").failing(),
    );

    let Err(e) = facade.open(ROOM, None, "Yugi").await else {
        panic!("open must fail without a transport");
    };
    assert!(matches!(e, ConnectionError::Transport(_)));
    assert_eq!(relay.subscriber_count(&RoomId::parse(ROOM).unwrap()), 0);
}

#[tokio::test]
async fn test_fresh_identity_per_open() {
    init_tracing();

    let relay = LocalRelay::new();
    let first = ConnectionFacade::new(Arc::new(relay.channel()), MockTransportFactory::new("x"))
        .open(ROOM, None, "Yugi")
        .await
        .expect("open");
    let second = ConnectionFacade::new(Arc::new(relay.channel()), MockTransportFactory::new("y"))
        .open(ROOM, None, "Yugi")
        .await
        .expect("open");

    assert_ne!(first.local_identity().id, second.local_identity().id);
    assert_eq!(first.local_identity().display_name, "Yugi");
    assert_eq!(first.room().as_str(), ROOM);

    first.close().await;
    second.close().await;
}
