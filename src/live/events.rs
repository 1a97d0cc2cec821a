use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LiveMessage;

/// Redis pub/sub channel carrying a broadcast's events across instances.
pub fn stream_topic(creator_id: Uuid) -> String {
    format!("live:stream:{creator_id}")
}

pub const STREAM_TOPIC_PATTERN: &str = "live:stream:*";

/// Server-to-viewer events for a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// A new chat/tip row was inserted for this stream.
    MessageInserted { message: LiveMessage },
    /// Full presence snapshot; receivers replace their set wholesale.
    PresenceSync { members: Vec<String> },
    /// Terminal: the creator ended the stream.
    StreamEnd,
}

/// Viewer-to-server commands over the live session socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Chat { content: String },
    Tip { content: String, amount_cents: i64 },
}
