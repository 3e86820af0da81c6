use duelcast_core::{
    ConnectionState, NetworkCandidate, PeerId, SdpKind, SessionDescription, SignalEnvelope,
};
use duelcast_peer::LocalRelay;

use crate::integration::{ROOM, init_tracing, open_with_factory, wait_connected};
use crate::utils::{
    MockTransportFactory, RelayDriver, SIGNAL_TIMEOUT_MS, TransportCall, settle, wait_for_call,
    wait_for_state,
};

fn is_offer(envelope: &SignalEnvelope) -> bool {
    matches!(envelope, SignalEnvelope::Offer(_))
}

fn is_answer(envelope: &SignalEnvelope) -> bool {
    matches!(envelope, SignalEnvelope::Answer(_))
}

#[tokio::test]
async fn test_failed_offer_retried_on_next_ready() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut b2 = RelayDriver::join(&relay, ROOM).await;
    let factory = MockTransportFactory::new("a1").fail_once(TransportCall::CreateOffer);
    let a1 = open_with_factory(&relay, factory.clone(), "a1", "Yugi").await;

    assert_eq!(
        b2.next_envelope().await,
        SignalEnvelope::ready(PeerId::from("a1"), "Yugi")
    );
    b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
        .await;

    let inspector = factory.inspector();
    wait_for_call(&inspector, TransportCall::CreateOffer, SIGNAL_TIMEOUT_MS)
        .await
        .expect("offer never attempted");
    settle().await;

    assert_eq!(*a1.state().borrow(), ConnectionState::AwaitingRemote);
    assert!(!b2.drain().iter().any(is_offer), "failed offer must not be sent");

    // The next ready starts a fresh attempt.
    b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
        .await;
    let offer = b2
        .next_matching(|e| match e {
            SignalEnvelope::Offer(payload) => Some(payload.offer),
            _ => None,
        })
        .await;
    assert_eq!(offer, SessionDescription::offer("offer-from-a1"));
    settle().await;

    assert!(!b2.drain().iter().any(is_offer), "exactly one offer expected");
    assert_eq!(inspector.count(&TransportCall::CreateOffer), 2);
    assert_eq!(*a1.state().borrow(), ConnectionState::Negotiating);

    a1.close().await;
}

#[tokio::test]
async fn test_rejected_offer_applies_on_redelivery() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut a1 = RelayDriver::join(&relay, ROOM).await;
    let factory =
        MockTransportFactory::new("b2").fail_once(TransportCall::SetRemote(SdpKind::Offer));
    let b2 = open_with_factory(&relay, factory.clone(), "b2", "Kaiba").await;
    a1.next_envelope().await;

    let offer = SignalEnvelope::offer(SessionDescription::offer("v=0"), "Yugi");
    a1.send(SignalEnvelope::IceCandidate(NetworkCandidate::new("c1")))
        .await;
    a1.send(offer.clone()).await;

    let inspector = factory.inspector();
    wait_for_call(&inspector, TransportCall::SetRemote(SdpKind::Offer), SIGNAL_TIMEOUT_MS)
        .await
        .expect("offer never applied");
    settle().await;

    assert_eq!(*b2.state().borrow(), ConnectionState::AwaitingRemote);
    assert!(inspector.candidates_applied().is_empty(), "c1 must stay queued");
    assert!(!a1.drain().iter().any(is_answer));

    a1.send(offer).await;
    a1.next_matching(|e| is_answer(&e).then_some(())).await;
    wait_connected(&[&b2]).await;

    assert_eq!(
        inspector.calls().into_iter().take(5).collect::<Vec<_>>(),
        vec![
            TransportCall::SetRemote(SdpKind::Offer),
            TransportCall::SetRemote(SdpKind::Offer),
            TransportCall::AddCandidate("c1".into()),
            TransportCall::CreateAnswer,
            TransportCall::SetLocal(SdpKind::Answer),
        ]
    );

    b2.close().await;
}

#[tokio::test]
async fn test_rejected_answer_applies_on_redelivery() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut b2 = RelayDriver::join(&relay, ROOM).await;
    let factory =
        MockTransportFactory::new("a1").fail_once(TransportCall::SetRemote(SdpKind::Answer));
    let a1 = open_with_factory(&relay, factory.clone(), "a1", "Yugi").await;
    b2.next_envelope().await;

    b2.send(SignalEnvelope::ready(PeerId::from("b2"), "Kaiba"))
        .await;
    b2.next_matching(|e| is_offer(&e).then_some(())).await;

    let answer = SignalEnvelope::answer(SessionDescription::answer("v=0"), "Kaiba");
    b2.send(answer.clone()).await;

    let inspector = factory.inspector();
    wait_for_call(&inspector, TransportCall::SetRemote(SdpKind::Answer), SIGNAL_TIMEOUT_MS)
        .await
        .expect("answer never applied");
    settle().await;
    assert_eq!(*a1.state().borrow(), ConnectionState::Negotiating);

    b2.send(answer).await;
    wait_connected(&[&a1]).await;
    assert_eq!(inspector.count(&TransportCall::SetRemote(SdpKind::Answer)), 2);

    a1.close().await;
}

#[tokio::test]
async fn test_failed_answer_is_terminal() {
    init_tracing();

    let relay = LocalRelay::new();
    let mut a1 = RelayDriver::join(&relay, ROOM).await;
    let factory = MockTransportFactory::new("b2").fail_once(TransportCall::CreateAnswer);
    let b2 = open_with_factory(&relay, factory.clone(), "b2", "Kaiba").await;
    a1.next_envelope().await;

    let offer = SignalEnvelope::offer(SessionDescription::offer("v=0"), "Yugi");
    a1.send(offer.clone()).await;

    wait_for_state(&mut b2.state(), ConnectionState::Failed, SIGNAL_TIMEOUT_MS)
        .await
        .expect("connection did not fail");

    // A failed connection ignores later negotiation traffic.
    a1.send(offer).await;
    settle().await;

    let inspector = factory.inspector();
    assert_eq!(inspector.count(&TransportCall::CreateAnswer), 1);
    assert_eq!(inspector.count(&TransportCall::SetLocal(SdpKind::Answer)), 0);
    assert!(!a1.drain().iter().any(is_answer));
    assert_eq!(*b2.state().borrow(), ConnectionState::Failed);

    b2.close().await;
}
