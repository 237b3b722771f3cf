//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use market_common::id::connection_id;
use market_common::protocol::Connected;
use market_common::{Envelope, EventName};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::auth::handshake::authenticate;
use crate::AppState;

use super::fanout::RoomEvent;
use super::session::GatewaySession;
use super::{membership, presence, router as event_router};

/// Close codes (4000-range for application-level).
const CLOSE_PING_TIMEOUT: u16 = 4009;

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

#[derive(Debug, Deserialize)]
pub struct HandshakeParams {
    token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/socket", get(ws_upgrade))
}

/// Authenticate before upgrading. A rejected handshake gets a plain 401 and
/// never becomes a connection.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<HandshakeParams>,
    headers: HeaderMap,
) -> Response {
    let principal = match authenticate(&state.tokens, params.token.as_deref(), &headers) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!(error = %err, "socket handshake rejected");
            return err.into_response();
        }
    };

    let session = GatewaySession::new(connection_id(), principal);
    ws.on_upgrade(move |socket| handle_connection(socket, state, session))
}

async fn handle_connection(socket: WebSocket, state: AppState, session: GatewaySession) {
    let (mut ws_tx, ws_rx) = socket.split();
    let session = Arc::new(session);

    // Subscribe before joining rooms so nothing addressed to them is missed.
    let broadcast_rx = state.gateway.subscribe();
    state.gateway.sessions().register(session.clone());

    if let Err(skip) = membership::on_connect(&state, &session).await {
        skip.log(&session.connection_id, "connect");
    }

    tracing::info!(
        connection_id = %session.connection_id,
        user_id = %session.principal.user_id(),
        role = %session.principal.role(),
        rooms = session.rooms().len(),
        "socket connected"
    );

    let ack = Envelope::from_payload(
        EventName::CONNECTED,
        &Connected {
            connection_id: session.connection_id.clone(),
            user_id: session.principal.user_id().to_string(),
            role: session.principal.role(),
            rooms: session.rooms().iter().map(ToString::to_string).collect(),
        },
    );
    let sent = match ack {
        Ok(envelope) => send_envelope(&mut ws_tx, &envelope).await,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode connected ack");
            false
        }
    };

    // The loop runs on its own task so a panic inside it still reaches the
    // cleanup below.
    if sent {
        let task = tokio::spawn(run_session(
            state.clone(),
            session.clone(),
            ws_tx,
            ws_rx,
            broadcast_rx,
        ));
        if let Err(e) = task.await {
            tracing::error!(
                connection_id = %session.connection_id,
                error = %e,
                "session task failed"
            );
        }
    }

    state.gateway.sessions().remove(&session.connection_id);
    if let Err(skip) = presence::on_disconnect(&state, &session.principal).await {
        skip.log(&session.connection_id, "disconnect");
    }

    tracing::info!(
        connection_id = %session.connection_id,
        user_id = %session.principal.user_id(),
        "socket disconnected"
    );
}

/// Main session event loop: route client events, forward broadcasts for
/// joined rooms, and ping the client to detect dead connections.
async fn run_session(
    state: AppState,
    session: Arc<GatewaySession>,
    mut ws_tx: WsSink,
    mut ws_rx: WsStream,
    mut broadcast_rx: broadcast::Receiver<Arc<RoomEvent>>,
) {
    let mut ping_timer = time::interval(state.config.ping_interval);
    ping_timer.tick().await; // First tick fires immediately; skip it.
    let mut awaiting_pong: Option<Instant> = None;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let envelope: Envelope = match serde_json::from_str(text.as_str()) {
                            Ok(e) => e,
                            Err(e) => {
                                tracing::debug!(
                                    connection_id = %session.connection_id,
                                    error = %e,
                                    "ignoring undecodable client frame"
                                );
                                continue;
                            }
                        };
                        let event = envelope.event.clone();
                        match event_router::dispatch(&state, &session, envelope).await {
                            Ok(notified) => tracing::debug!(
                                connection_id = %session.connection_id,
                                %event,
                                emitted = notified.len(),
                                "event routed"
                            ),
                            Err(skip) => skip.log(&session.connection_id, &event),
                        }
                    }
                    Some(Ok(Message::Pong(_))) => awaiting_pong = None,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection_id = %session.connection_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            result = broadcast_rx.recv() => {
                match result {
                    Ok(payload) => {
                        if !session.should_receive(&payload.target) {
                            continue;
                        }
                        let envelope = Envelope::new(&payload.event_name, payload.data.clone());
                        if !send_envelope(&mut ws_tx, &envelope).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            connection_id = %session.connection_id,
                            skipped = n,
                            "socket lagged behind broadcast"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = ping_timer.tick() => {
                match awaiting_pong {
                    Some(sent) if sent.elapsed() >= state.config.ping_timeout => {
                        tracing::debug!(
                            connection_id = %session.connection_id,
                            "ping timeout, closing connection"
                        );
                        let _ = send_close(&mut ws_tx, CLOSE_PING_TIMEOUT, "Ping timeout").await;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        if ws_tx.send(Message::Ping(Default::default())).await.is_err() {
                            break;
                        }
                        awaiting_pong = Some(Instant::now());
                    }
                }
            }
        }
    }
}

/// Serialize and send one envelope. Returns `false` once the socket is gone.
async fn send_envelope(ws_tx: &mut WsSink, envelope: &Envelope) -> bool {
    let json = match serde_json::to_string(envelope) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(error = %e, event = %envelope.event, "failed to encode envelope");
            return true;
        }
    };
    ws_tx.send(Message::Text(json.into())).await.is_ok()
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(ws_tx: &mut WsSink, code: u16, reason: &str) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
