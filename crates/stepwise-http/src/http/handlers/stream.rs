//! WebSocket handler bridging a step's stream binding onto a socket.
//!
//! `GET /flow/{label}/stream` locates the step's stream handler first
//! (traversal errors fail the upgrade with a normal HTTP error), then
//! upgrades and pumps text frames between the socket and the handler's
//! [`MessageChannel`] until either side closes. Running a stream never
//! mutates the session; a handler that wants to advance the workflow
//! submits a process request through the client.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use stepwise_core::{MessageChannel, StreamBinding};

use crate::http::error::AppError;
use crate::session_store::resolve_session_id;
use crate::state::AppState;

/// GET /flow/{label}/stream - upgrade to a WebSocket for a stream step.
pub async fn stream_step<T: Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    Path(label): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let (id, _) = resolve_session_id(&headers);
    let session = state.sessions.snapshot(id);

    match state.sequencer.handle_stream(&session, &label).await {
        Ok(binding) => ws.on_upgrade(move |socket| bridge(socket, binding)),
        Err(error) => AppError::new(error, state.restart.clone()).into_response(),
    }
}

/// Pump text frames between the socket and the stream handler.
async fn bridge(socket: WebSocket, binding: StreamBinding) {
    let (host_end, handler_end) = MessageChannel::pair();
    let MessageChannel {
        mut incoming,
        outgoing,
    } = host_end;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let handler = tokio::spawn(binding.run(handler_end));

    loop {
        tokio::select! {
            // --- Handler output toward the client ---
            out = incoming.recv() => match out {
                Some(msg) => {
                    if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                // Handler dropped its outgoing side: stream finished.
                None => break,
            },

            // --- Client frames toward the handler ---
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if outgoing.send(text.to_string()).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    tracing::debug!("websocket receive error: {err}");
                    break;
                }
                // Binary and ping/pong frames are not part of the protocol.
                Some(Ok(_)) => {}
            },
        }
    }

    // Closing our channel ends lets a well-behaved handler observe EOF
    // and return.
    drop(incoming);
    drop(outgoing);

    match handler.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "stream handler failed"),
        Err(err) => tracing::warn!(error = %err, "stream handler panicked"),
    }
}
