use crate::{RelayConfig, RelayService};
use axum::Router;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use axum::routing::get;
use duelcast_core::RelayFrame;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub fn router(service: RelayService, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .with_state(service)
}

pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind).await?;
    serve_listener(listener, RelayService::new(), &config.path).await
}

pub async fn serve_listener(
    listener: TcpListener,
    service: RelayService,
    path: &str,
) -> anyhow::Result<()> {
    info!("Relay listening on ws://{}{}", listener.local_addr()?, path);
    axum::serve(listener, router(service, path)).await?;
    Ok(())
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: RelayService) {
    let id = Uuid::new_v4();
    info!("New WebSocket connection: {}", id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayFrame>(text.as_str()) {
                        Ok(frame) => service.handle_frame(id, frame),
                        Err(e) => {
                            warn!("Invalid relay frame from {}: {}", id, e);
                            service.send_frame(
                                &id,
                                &RelayFrame::Error {
                                    message: format!("invalid frame: {e}"),
                                },
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_connection(&id);
    info!("WebSocket disconnected: {}", id);
}
