//! WebSocket entry point for live sessions.
//!
//! `GET /ws/streams/{creator_id}` — entitlement gate on upgrade, presence
//! track on open, chat/tip commands inbound, channel events outbound,
//! deterministic teardown on close.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::MaybeUser;
use crate::live::{ChannelEvent, ClientCommand, ViewerSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub display_name: Option<String>,
}

pub async fn live_stream_ws(
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<WsParams>,
    viewer: MaybeUser,
    body: web::Payload,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let creator_id = path.into_inner();

    // Gate before the upgrade: a denied viewer gets the lock-screen payload
    // as a plain HTTP error, not a socket that immediately closes.
    let session = state
        .sessions
        .join(creator_id, viewer.0, query.display_name.clone())
        .await?;

    tracing::info!(
        %creator_id,
        viewer = ?session.viewer_id,
        presence_key = %session.presence_key,
        "viewer joined live session"
    );

    // A handshake failure after the join must not strand the presence
    // entry.
    let (response, ws_session, msg_stream) = match actix_ws::handle(&req, body) {
        Ok(parts) => parts,
        Err(e) => {
            state.sessions.leave(&session).await;
            return Err(e);
        }
    };
    actix_web::rt::spawn(run_session(state, session, ws_session, msg_stream));
    Ok(response)
}

async fn run_session(
    state: web::Data<AppState>,
    mut session: ViewerSession,
    mut ws: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
) {
    // Replay persisted chat so a late joiner sees the session so far.
    for message in std::mem::take(&mut session.backlog) {
        let event = ChannelEvent::MessageInserted { message };
        if send_event(&mut ws, &event).await.is_err() {
            state.sessions.leave(&session).await;
            return;
        }
    }

    loop {
        tokio::select! {
            maybe_event = session.rx.recv() => {
                let Some(event) = maybe_event else { break };
                let terminal = matches!(event, ChannelEvent::StreamEnd);
                if send_event(&mut ws, &event).await.is_err() {
                    break;
                }
                if terminal {
                    // All non-streamer clients exit on stream end.
                    break;
                }
            }

            incoming = msg_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_command(&state, &session, &mut ws, &text).await;
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if ws.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "live session socket error");
                        break;
                    }
                }
            }
        }
    }

    // Untrack presence and unsubscribe regardless of how the loop ended.
    state.sessions.leave(&session).await;
    let _ = ws.close(None).await;
}

async fn send_event(ws: &mut actix_ws::Session, event: &ChannelEvent) -> Result<(), ()> {
    match serde_json::to_string(event) {
        Ok(text) => ws.text(text).await.map_err(|_| ()),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize channel event");
            Ok(())
        }
    }
}

/// A failed send is reported to the sender only; other participants are
/// untouched.
async fn handle_command(
    state: &web::Data<AppState>,
    session: &ViewerSession,
    ws: &mut actix_ws::Session,
    text: &str,
) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(_) => {
            let _ = ws
                .text(json!({ "type": "error", "error": "unrecognized command" }).to_string())
                .await;
            return;
        }
    };

    let result = match command {
        ClientCommand::Chat { content } => state.sessions.post_chat(session, content).await,
        ClientCommand::Tip {
            content,
            amount_cents,
        } => state.sessions.post_tip(session, content, amount_cents).await,
    };

    if let Err(e) = result {
        let _ = ws
            .text(json!({ "type": "error", "error": e.to_string() }).to_string())
            .await;
    }
}
