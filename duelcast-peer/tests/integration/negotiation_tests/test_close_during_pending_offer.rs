use duelcast_core::{ConnectionState, PeerId, PeerIdentity, RoomId, SdpKind, SignalEnvelope};
use duelcast_peer::{ConnectionFacade, LocalRelay};
use std::sync::Arc;

use crate::integration::{ROOM, init_tracing};
use crate::utils::{
    MockTransportFactory, RelayDriver, SIGNAL_TIMEOUT_MS, TransportCall, settle, wait_for_call,
};

#[tokio::test]
async fn test_close_during_pending_offer() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut b2 = RelayDriver::join(&relay, ROOM).await;

    let (factory, gate) = MockTransportFactory::new("a1").with_offer_gate();
    let facade = ConnectionFacade::new(Arc::new(relay.channel()), factory.clone());
    let a1 = facade
        .open_with_identity(ROOM, None, PeerIdentity::new("a1", "Yugi"))
        .await
        .expect("open");

    b2.next_envelope().await;
    b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
        .await;

    let inspector = factory.inspector();
    wait_for_call(&inspector, TransportCall::CreateOffer, SIGNAL_TIMEOUT_MS)
        .await
        .expect("offer creation never started");

    a1.close().await;
    // The pending offer resolves only after teardown.
    gate.notify_one();
    settle().await;

    assert_eq!(*a1.state().borrow(), ConnectionState::Closed);
    let calls = inspector.calls();
    assert!(!calls.contains(&TransportCall::SetLocal(SdpKind::Offer)));
    assert_eq!(inspector.count(&TransportCall::Close), 1);
    assert!(
        b2.drain()
            .iter()
            .all(|e| !matches!(e, SignalEnvelope::Offer(_))),
        "no offer may leave a closed connection"
    );
    assert_eq!(relay.subscriber_count(&RoomId::parse(ROOM).unwrap()), 1);

    // Closing again is harmless.
    a1.close().await;
    assert_eq!(inspector.count(&TransportCall::Close), 1);
}

#[tokio::test]
async fn test_drop_closes_connection() {
    init_tracing();

    let relay = LocalRelay::new();
    let factory = MockTransportFactory::new("a1");
    let facade = ConnectionFacade::new(Arc::new(relay.channel()), factory.clone());
    let a1 = facade
        .open_with_identity(ROOM, None, PeerIdentity::new("a1", "Yugi"))
        .await
        .expect("open");

    let inspector = factory.inspector();
    drop(a1);

    wait_for_call(&inspector, TransportCall::Close, SIGNAL_TIMEOUT_MS)
        .await
        .expect("transport not closed on drop");
    settle().await;
    assert_eq!(relay.subscriber_count(&RoomId::parse(ROOM).unwrap()), 0);
}
