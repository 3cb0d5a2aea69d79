//! WebSocket push of monitor results

use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde_json::json;

use super::SharedState;

/// How often the result queue is drained for connected panels
const PUSH_INTERVAL: Duration = Duration::from_millis(500);

pub(super) async fn results_stream(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| push_results(socket, state))
}

async fn push_results(socket: WebSocket, state: SharedState) {
    let (mut sink, mut stream) = socket.split();

    // The client sends nothing we care about; its stream ending is the
    // disconnect signal.
    let mut client_gone = tokio::spawn(async move {
        while let Some(Ok(_)) = stream.next().await {}
    });

    let mut ticker = tokio::time::interval(PUSH_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut client_gone => break,
            _ = ticker.tick() => {
                let results = match state.supervisor().await {
                    Some(supervisor) => supervisor.check_results().await,
                    None => Vec::new(),
                };
                if results.is_empty() {
                    continue;
                }
                let Ok(payload) = serde_json::to_string(&json!({ "results": results })) else {
                    continue;
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        }
    }

    client_gone.abort();
    log::debug!("results stream closed");
}
