use duelcast_core::{ConnectionState, PeerId, SdpKind, SessionDescription, SignalEnvelope};
use duelcast_peer::LocalRelay;

use crate::integration::{ROOM, init_tracing, open_mock_peer, wait_connected};
use crate::utils::{RelayDriver, TransportCall, settle};

#[tokio::test]
async fn test_duplicate_offer_is_ignored() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut a1 = RelayDriver::join(&relay, ROOM).await;
    let (b2, b2_transport) = open_mock_peer(&relay, "b2", "Kaiba").await;
    a1.next_envelope().await;

    let offer = SignalEnvelope::offer(SessionDescription::offer("v=0"), "Yugi");
    a1.send(offer.clone()).await;
    a1.send(offer).await;

    a1.next_matching(|e| matches!(e, SignalEnvelope::Answer(_)).then_some(()))
        .await;
    wait_connected(&[&b2]).await;
    settle().await;

    let inspector = b2_transport.inspector();
    assert_eq!(inspector.count(&TransportCall::SetRemote(SdpKind::Offer)), 1);
    assert_eq!(inspector.count(&TransportCall::CreateAnswer), 1);
    assert!(
        a1.drain()
            .iter()
            .all(|e| !matches!(e, SignalEnvelope::Answer(_))),
        "second offer must not be answered"
    );
    assert_eq!(*b2.state().borrow(), ConnectionState::Connected);

    b2.close().await;
}

#[tokio::test]
async fn test_duplicate_answer_is_ignored() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut b2 = RelayDriver::join(&relay, ROOM).await;
    let (a1, a1_transport) = open_mock_peer(&relay, "a1", "Yugi").await;

    assert_eq!(
        b2.next_envelope().await,
        SignalEnvelope::ready(PeerId::from("a1"), "Yugi")
    );
    b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
        .await;

    let offer = b2
        .next_matching(|e| match e {
            SignalEnvelope::Offer(payload) => Some(payload.offer),
            _ => None,
        })
        .await;
    assert_eq!(offer, SessionDescription::offer("offer-from-a1"));

    let answer = SignalEnvelope::answer(SessionDescription::answer("v=0"), "Kaiba");
    b2.send(answer.clone()).await;
    b2.send(answer).await;

    wait_connected(&[&a1]).await;
    settle().await;

    let inspector = a1_transport.inspector();
    assert_eq!(inspector.count(&TransportCall::SetRemote(SdpKind::Answer)), 1);
    assert_eq!(inspector.count(&TransportCall::CreateOffer), 1);
    assert_eq!(*a1.state().borrow(), ConnectionState::Connected);

    a1.close().await;
}

#[tokio::test]
async fn test_ready_after_offer_is_a_no_op() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut b2 = RelayDriver::join(&relay, ROOM).await;
    let (a1, a1_transport) = open_mock_peer(&relay, "a1", "Yugi").await;
    b2.next_envelope().await;

    for _ in 0..3 {
        b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
            .await;
    }
    b2.next_matching(|e| matches!(e, SignalEnvelope::Offer(_)).then_some(()))
        .await;
    settle().await;

    assert_eq!(a1_transport.inspector().count(&TransportCall::CreateOffer), 1);
    assert!(
        b2.drain()
            .iter()
            .all(|e| !matches!(e, SignalEnvelope::Offer(_))),
        "only one offer may be sent"
    );
    assert_eq!(*a1.state().borrow(), ConnectionState::Negotiating);

    a1.close().await;
}
