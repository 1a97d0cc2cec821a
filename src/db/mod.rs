//! Typed calls to the managed backend.
//!
//! The traits here are the service's only view of persistent state
//! (subscriptions, purchases, tiers, content, chat rows, the tip ledger).
//! Production wires the sqlx Postgres repositories; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    ContentItem, LiveAccessConfig, LiveMessage, MessageKind, PurchaseRecord, SubscriptionRecord,
    TierDefinition, Tipper,
};

pub mod catalog_repo;
pub mod entitlement_repo;
pub mod live_repo;

pub use catalog_repo::PgCatalogRepo;
pub use entitlement_repo::PgEntitlementRepo;
pub use live_repo::PgLiveRepo;

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Write-model for a chat/tip-display row; the server assigns id and
/// timestamp.
#[derive(Debug, Clone)]
pub struct NewLiveMessage {
    pub creator_id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub tip_amount_cents: Option<i64>,
}

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn subscriptions_for_fan(&self, fan_id: Uuid) -> AppResult<Vec<SubscriptionRecord>>;
    async fn purchases_for_user(&self, user_id: Uuid) -> AppResult<Vec<PurchaseRecord>>;
    /// Append a confirmed purchase. Must be idempotent: re-confirming an
    /// already-purchased item is a no-op.
    async fn confirm_purchase(&self, user_id: Uuid, content_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn content_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>>;
    async fn tier(&self, tier_id: Uuid) -> AppResult<Option<TierDefinition>>;
}

/// The authoritative tip ledger, written by the payment confirmation path.
/// The leaderboard is only ever derived from here, never from broadcast
/// tip-display events.
#[async_trait]
pub trait TipLedger: Send + Sync {
    async fn stream_leaderboard(&self, creator_id: Uuid) -> AppResult<Vec<Tipper>>;
}

#[async_trait]
pub trait LiveChatStore: Send + Sync {
    async fn append_message(&self, msg: NewLiveMessage) -> AppResult<LiveMessage>;
    /// Most recent rows in ascending arrival order.
    async fn recent_messages(&self, creator_id: Uuid, limit: i64) -> AppResult<Vec<LiveMessage>>;
}

#[async_trait]
pub trait StreamStateStore: Send + Sync {
    /// The creator's live gate, `Some` only while the stream is live.
    async fn live_profile(&self, creator_id: Uuid) -> AppResult<Option<LiveAccessConfig>>;
    async fn set_live(&self, creator_id: Uuid, config: LiveAccessConfig) -> AppResult<()>;
    /// Atomic termination: wipe the session's chat rows and flip the live
    /// flag off in one transaction.
    async fn clear_chat_and_go_offline(&self, creator_id: Uuid) -> AppResult<()>;
}

/// Bundle of store handles shared across handlers and the session manager.
#[derive(Clone)]
pub struct Stores {
    pub entitlements: Arc<dyn EntitlementStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub tips: Arc<dyn TipLedger>,
    pub chat: Arc<dyn LiveChatStore>,
    pub stream_state: Arc<dyn StreamStateStore>,
}

impl Stores {
    /// Wire every trait to its Postgres repository.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            entitlements: Arc::new(PgEntitlementRepo::new(pool.clone())),
            catalog: Arc::new(PgCatalogRepo::new(pool.clone())),
            tips: Arc::new(PgLiveRepo::new(pool.clone())),
            chat: Arc::new(PgLiveRepo::new(pool.clone())),
            stream_state: Arc::new(PgLiveRepo::new(pool)),
        }
    }
}
