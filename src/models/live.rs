use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    Chat,
    Tip,
}

/// A chat or tip-display row for a live broadcast.
///
/// Rows exist only for the duration of one broadcast; chat history is wiped
/// when the creator ends the stream. `user_id = None` marks a guest sender.
/// Ordering is by the server-assigned `created_at`, not the client clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveMessage {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub tip_amount_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Ranked tip aggregate for one viewer in one live session.
///
/// Always derived from the durable tip ledger, never by summing broadcast
/// tip-display messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tipper {
    pub user_id: Uuid,
    pub display_name: String,
    pub total_tipped_cents: i64,
}

/// Creator's live-access gate, chosen before going live and immutable while
/// the stream is up.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LiveAccessConfig {
    pub requires_subscription: bool,
    pub required_tier_id: Option<Uuid>,
}
