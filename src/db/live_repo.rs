use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{LiveChatStore, NewLiveMessage, StreamStateStore, TipLedger};
use crate::error::{AppError, AppResult};
use crate::models::{LiveAccessConfig, LiveMessage, MessageKind, Tipper};

/// Postgres backing for the live-session collaborators: chat rows, the
/// creator's live flag + access config, and the trusted tip ledger.
pub struct PgLiveRepo {
    pool: PgPool,
}

impl PgLiveRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    creator_id: Uuid,
    user_id: Option<Uuid>,
    display_name: String,
    content: String,
    kind: String,
    tip_amount_cents: Option<i64>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_model(self) -> AppResult<LiveMessage> {
        let kind = match self.kind.as_str() {
            "CHAT" => MessageKind::Chat,
            "TIP" => MessageKind::Tip,
            other => {
                return Err(AppError::Database(format!("unknown message kind {other}")));
            }
        };
        Ok(LiveMessage {
            id: self.id,
            creator_id: self.creator_id,
            user_id: self.user_id,
            display_name: self.display_name,
            content: self.content,
            kind,
            tip_amount_cents: self.tip_amount_cents,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TipperRow {
    user_id: Uuid,
    display_name: String,
    total_tipped_cents: i64,
}

#[derive(sqlx::FromRow)]
struct LiveStateRow {
    is_live: bool,
    requires_subscription: bool,
    required_tier_id: Option<Uuid>,
}

#[async_trait]
impl LiveChatStore for PgLiveRepo {
    async fn append_message(&self, msg: NewLiveMessage) -> AppResult<LiveMessage> {
        let kind = match msg.kind {
            MessageKind::Chat => "CHAT",
            MessageKind::Tip => "TIP",
        };
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO live_messages (creator_id, user_id, display_name, content, kind, tip_amount_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, creator_id, user_id, display_name, content, kind, tip_amount_cents, created_at
            "#,
        )
        .bind(msg.creator_id)
        .bind(msg.user_id)
        .bind(&msg.display_name)
        .bind(&msg.content)
        .bind(kind)
        .bind(msg.tip_amount_cents)
        .fetch_one(&self.pool)
        .await?;

        row.into_model()
    }

    async fn recent_messages(&self, creator_id: Uuid, limit: i64) -> AppResult<Vec<LiveMessage>> {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, creator_id, user_id, display_name, content, kind, tip_amount_cents, created_at
            FROM live_messages
            WHERE creator_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(creator_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Replay to late joiners in arrival order.
        rows.reverse();
        rows.into_iter().map(MessageRow::into_model).collect()
    }
}

#[async_trait]
impl TipLedger for PgLiveRepo {
    async fn stream_leaderboard(&self, creator_id: Uuid) -> AppResult<Vec<Tipper>> {
        let rows = sqlx::query_as::<_, TipperRow>(
            r#"
            SELECT user_id, display_name, SUM(amount_cents) AS total_tipped_cents
            FROM stream_tips
            WHERE creator_id = $1
            GROUP BY user_id, display_name
            ORDER BY total_tipped_cents DESC
            LIMIT 50
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Tipper {
                user_id: r.user_id,
                display_name: r.display_name,
                total_tipped_cents: r.total_tipped_cents,
            })
            .collect())
    }
}

#[async_trait]
impl StreamStateStore for PgLiveRepo {
    async fn live_profile(&self, creator_id: Uuid) -> AppResult<Option<LiveAccessConfig>> {
        let row = sqlx::query_as::<_, LiveStateRow>(
            r#"
            SELECT is_live, requires_subscription, required_tier_id
            FROM creator_live_state
            WHERE creator_id = $1
            "#,
        )
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.filter(|r| r.is_live).map(|r| LiveAccessConfig {
            requires_subscription: r.requires_subscription,
            required_tier_id: r.required_tier_id,
        }))
    }

    async fn set_live(&self, creator_id: Uuid, config: LiveAccessConfig) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO creator_live_state (creator_id, is_live, requires_subscription, required_tier_id)
            VALUES ($1, TRUE, $2, $3)
            ON CONFLICT (creator_id) DO UPDATE
            SET is_live = TRUE,
                requires_subscription = EXCLUDED.requires_subscription,
                required_tier_id = EXCLUDED.required_tier_id
            "#,
        )
        .bind(creator_id)
        .bind(config.requires_subscription)
        .bind(config.required_tier_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_chat_and_go_offline(&self, creator_id: Uuid) -> AppResult<()> {
        // Chat is scoped to a single broadcast: the wipe and the flag flip
        // must land together.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM live_messages WHERE creator_id = $1")
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE creator_live_state SET is_live = FALSE WHERE creator_id = $1")
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
