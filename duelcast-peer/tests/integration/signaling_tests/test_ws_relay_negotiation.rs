use duelcast_core::{CardDeclaration, ConnectionError, PeerIdentity, RoomId, SdpKind};
use duelcast_peer::{ConnectionFacade, SignalingChannel, WsSignalingChannel};
use duelcast_relay::{RelayService, serve_listener};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::integration::{ROOM, init_tracing, wait_connected};
use crate::utils::{MockTransportFactory, SIGNAL_TIMEOUT_MS, TransportCall};

async fn start_relay() -> (String, RelayService) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = RelayService::new();

    let server = service.clone();
    tokio::spawn(async move {
        let _ = serve_listener(listener, server, "/ws").await;
    });

    (format!("ws://{addr}/ws"), service)
}

#[tokio::test]
async fn test_peers_negotiate_over_ws_relay() {
    init_tracing();

    let (url, service) = start_relay().await;

    let a1_factory = MockTransportFactory::new("a1");
    let b2_factory = MockTransportFactory::new("b2");
    let a1_channel = WsSignalingChannel::connect(&url).await.expect("a1 connects");
    let b2_channel = WsSignalingChannel::connect(&url).await.expect("b2 connects");

    let a1 = ConnectionFacade::new(Arc::new(a1_channel), a1_factory.clone())
        .open_with_identity(ROOM, None, PeerIdentity::new("a1", "Yugi"))
        .await
        .expect("open a1");
    let b2 = ConnectionFacade::new(Arc::new(b2_channel), b2_factory.clone())
        .open_with_identity(ROOM, None, PeerIdentity::new("b2", "Kaiba"))
        .await
        .expect("open b2");

    wait_connected(&[&a1, &b2]).await;
    assert_eq!(a1_factory.inspector().count(&TransportCall::CreateOffer), 1);
    assert_eq!(b2_factory.inspector().count(&TransportCall::SetRemote(SdpKind::Offer)), 1);
    assert_eq!(a1.remote_name().borrow().as_deref(), Some("Kaiba"));
    assert_eq!(b2.remote_name().borrow().as_deref(), Some("Yugi"));

    let mut inbox = b2.app_messages();
    let card = CardDeclaration::new("Pot of Greed", "Draw 2 cards.", "", "");
    a1.send_app(card.clone()).await.expect("send card");
    let received = tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), inbox.recv())
        .await
        .expect("timeout waiting for card")
        .expect("inbox closed");
    assert_eq!(received, card);

    a1.close().await;
    b2.close().await;

    let room = RoomId::parse(ROOM).unwrap();
    let start = std::time::Instant::now();
    while service.member_count(&room) > 0 {
        assert!(
            start.elapsed() < Duration::from_millis(SIGNAL_TIMEOUT_MS),
            "relay still lists members after close"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_ws_channel_rejects_second_subscription() {
    init_tracing();

    let (url, _) = start_relay().await;
    let channel = WsSignalingChannel::connect(&url).await.expect("connect");
    let room = RoomId::parse(ROOM).unwrap();

    let _first = channel.subscribe(&room).await.expect("first subscribe");
    let Err(e) = channel.subscribe(&room).await else {
        panic!("second subscription must fail");
    };
    assert!(matches!(e, ConnectionError::AlreadySubscribed(_)));
}

#[tokio::test]
async fn test_ws_channel_rejects_bad_url() {
    init_tracing();

    let Err(e) = WsSignalingChannel::connect("not a url").await else {
        panic!("connect must fail");
    };
    assert!(matches!(e, ConnectionError::Transport(_)));
}
