//! Cross-instance event fanout over Redis pub/sub.
//!
//! Each live broadcast has one channel (`live:stream:{creator_id}`); every
//! instance publishes its locally originated events there and re-broadcasts
//! inbound ones into its own registry. Frames carry the publishing
//! instance's id so an instance never re-delivers its own echo.

use futures_util::StreamExt;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{stream_topic, ChannelEvent, STREAM_TOPIC_PATTERN};
use super::session::LiveSessionManager;

#[derive(Debug, Serialize, Deserialize)]
struct FanoutFrame {
    origin: Uuid,
    #[serde(flatten)]
    event: ChannelEvent,
}

pub async fn publish(
    client: &Client,
    origin: Uuid,
    creator_id: Uuid,
    event: &ChannelEvent,
) -> redis::RedisResult<()> {
    let frame = FanoutFrame {
        origin,
        event: event.clone(),
    };
    let payload = serde_json::to_string(&frame).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "serialize fanout frame",
            e.to_string(),
        ))
    })?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.publish::<_, _, ()>(stream_topic(creator_id), payload)
        .await
}

/// Long-running listener; resolves only on connection loss, so the caller
/// is expected to loop and resubscribe.
pub async fn run_listener(
    client: Client,
    sessions: LiveSessionManager,
) -> redis::RedisResult<()> {
    let local_origin = sessions.instance_id();
    // Pub/sub requires a dedicated connection, not the multiplexed one.
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.psubscribe(STREAM_TOPIC_PATTERN).await?;
    let mut stream = pubsub.on_message();

    while let Some(msg) = stream.next().await {
        let channel: String = msg.get_channel_name().into();
        let payload: String = msg.get_payload()?;

        let Some(id_part) = channel.strip_prefix("live:stream:") else {
            continue;
        };
        let Ok(creator_id) = Uuid::parse_str(id_part) else {
            tracing::warn!(%channel, "fanout message on malformed stream channel");
            continue;
        };
        match serde_json::from_str::<FanoutFrame>(&payload) {
            Ok(frame) if frame.origin == local_origin => {}
            Ok(frame) => {
                // An end_stream run elsewhere must also stop this
                // instance's poller and free its handle.
                if matches!(frame.event, ChannelEvent::StreamEnd) {
                    sessions.handle_remote_end(creator_id).await;
                }
                sessions
                    .registry()
                    .broadcast(creator_id, frame.event)
                    .await;
            }
            Err(e) => {
                tracing::warn!(%creator_id, error = %e, "dropping undecodable fanout event");
            }
        }
    }

    Ok(())
}

/// Spawn the listener with automatic resubscribe on transport drop.
pub fn start_listener(client: Client, sessions: LiveSessionManager) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = run_listener(client.clone(), sessions.clone()).await {
                tracing::warn!(error = %e, "fanout listener dropped; resubscribing");
            }
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }
    })
}
