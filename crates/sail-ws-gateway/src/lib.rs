// SPDX-License-Identifier: Apache-2.0
//! WebSocket transport adapter for browser clients. Terminates the WS
//! connection, decodes/encodes JSON frames, and forwards everything
//! else to the tick thread over `sail-session`'s channels.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use sail_proto::ClientMessage;
use sail_session::{transport, SessionHandle};

/// Outbound channel capacity per connection before snapshots start
/// being dropped (§5: drop-oldest policy for the unreliable stream).
const OUTBOX_CAPACITY: usize = 64;

#[derive(Clone)]
struct AppState {
    scheduler: SessionHandle,
}

/// Binds `listen` and serves WebSocket clients until the listener
/// errors or the process is asked to stop. Runs forever otherwise, so
/// callers that want graceful shutdown should race this future against
/// their own cancellation signal.
pub async fn serve(scheduler: SessionHandle, listen: SocketAddr) -> Result<()> {
    let state = Arc::new(AppState { scheduler });
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    info!(%listen, "ws gateway listening");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, peer))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, peer: SocketAddr) {
    let channels = match transport::register(&state.scheduler, OUTBOX_CAPACITY).await {
        Ok(channels) => channels,
        Err(err) => {
            warn!(?peer, %err, "failed to register connection with tick thread");
            return;
        }
    };
    let session_id = channels.session_id;
    info!(?peer, ?session_id, "ws client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut outbound = channels.outbound;

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let text = frame.message.to_json();
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };
        match ClientMessage::from_json(&text) {
            Ok(message) => transport::forward_message(&state.scheduler, session_id, message).await,
            Err(err) => warn!(?peer, %err, "dropped malformed client message"),
        }
    }

    transport::forward_disconnect(&state.scheduler, session_id).await;
    writer.abort();
    info!(?peer, ?session_id, "ws client disconnected");
}
