//! Per-broadcast session coordination.
//!
//! State machine per creator: `Offline -> (go_live) -> Live -> (end_stream)
//! -> Offline`. While live, the manager gates joins through the entitlement
//! resolver, tracks presence, fans out chat/tip-display events, and keeps
//! the trusted leaderboard cache polled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::events::ChannelEvent;
use super::leaderboard::{spawn_poller, LeaderboardCache};
use super::presence::presence_key;
use super::registry::{StreamRegistry, SubscriberId};
use super::fanout;
use crate::db::{NewLiveMessage, Stores};
use crate::error::{AppError, AppResult};
use crate::models::{ContentItem, LiveAccessConfig, LiveMessage, MessageKind, Tipper};
use crate::services::AccessService;

struct LiveStreamHandle {
    config: LiveAccessConfig,
    leaderboard: LeaderboardCache,
    poller: JoinHandle<()>,
}

impl Drop for LiveStreamHandle {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

/// One joined viewer connection. Holds everything needed for deterministic
/// teardown: presence untrack, registry unsubscribe.
#[derive(Debug)]
pub struct ViewerSession {
    pub creator_id: Uuid,
    pub viewer_id: Option<Uuid>,
    pub display_name: String,
    pub presence_key: String,
    pub rx: UnboundedReceiver<ChannelEvent>,
    /// Chat rows persisted before this viewer joined, arrival order.
    pub backlog: Vec<LiveMessage>,
    subscriber_id: SubscriberId,
}

#[derive(Clone)]
pub struct LiveSessionManager {
    registry: StreamRegistry,
    stores: Stores,
    access: AccessService,
    redis: Option<redis::Client>,
    /// Identifies this instance's frames on the fanout channel.
    instance_id: Uuid,
    poll_interval: Duration,
    chat_history_limit: i64,
    streams: Arc<RwLock<HashMap<Uuid, LiveStreamHandle>>>,
}

impl LiveSessionManager {
    pub fn new(
        registry: StreamRegistry,
        stores: Stores,
        redis: Option<redis::Client>,
        poll_interval: Duration,
        chat_history_limit: i64,
    ) -> Self {
        let access = AccessService::new(stores.clone());
        Self {
            registry,
            stores,
            access,
            redis,
            instance_id: Uuid::new_v4(),
            poll_interval,
            chat_history_limit,
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Creator goes live with a fixed access gate. The gate is mutable only
    /// while offline; changing it means ending and restarting the stream.
    pub async fn go_live(&self, creator_id: Uuid, config: LiveAccessConfig) -> AppResult<()> {
        {
            let streams = self.streams.read().await;
            if streams.contains_key(&creator_id) {
                return Err(AppError::StreamAlreadyLive);
            }
        }
        if self.stores.stream_state.live_profile(creator_id).await?.is_some() {
            return Err(AppError::StreamAlreadyLive);
        }

        self.stores.stream_state.set_live(creator_id, config).await?;

        let leaderboard = LeaderboardCache::new();
        // Prime the ranking once so early joiners see data before the first
        // interval tick lands.
        leaderboard
            .refresh(creator_id, self.stores.tips.as_ref())
            .await;
        let poller = spawn_poller(
            creator_id,
            self.stores.tips.clone(),
            leaderboard.clone(),
            self.poll_interval,
        );

        let mut streams = self.streams.write().await;
        streams.insert(
            creator_id,
            LiveStreamHandle {
                config,
                leaderboard,
                poller,
            },
        );

        tracing::info!(%creator_id, requires_subscription = config.requires_subscription, "stream live");
        Ok(())
    }

    /// Atomic termination: wipe chat + flip offline in one store call, stop
    /// the poller, and tell every connected client to exit.
    pub async fn end_stream(&self, creator_id: Uuid) -> AppResult<()> {
        let handle = self.streams.write().await.remove(&creator_id);
        if handle.is_none() && self.stores.stream_state.live_profile(creator_id).await?.is_none() {
            return Err(AppError::StreamOffline);
        }
        drop(handle); // aborts the poller

        self.stores
            .stream_state
            .clear_chat_and_go_offline(creator_id)
            .await?;

        self.broadcast(creator_id, ChannelEvent::StreamEnd).await;
        crate::metrics::clear_live_viewers(creator_id);
        tracing::info!(%creator_id, "stream ended, chat cleared");
        Ok(())
    }

    /// Release per-stream state for a broadcast ended on another instance.
    /// The store was already wiped by whoever ran `end_stream`; only the
    /// local handle (and its poller) needs dropping.
    pub async fn handle_remote_end(&self, creator_id: Uuid) {
        if self.streams.write().await.remove(&creator_id).is_some() {
            tracing::info!(%creator_id, "released handle for remotely ended stream");
        }
        crate::metrics::clear_live_viewers(creator_id);
    }

    /// Viewer joins a live session. Re-runs the entitlement resolver against
    /// the stream's synthetic gate item; a denial carries the tier the lock
    /// screen should offer.
    pub async fn join(
        &self,
        creator_id: Uuid,
        viewer: Option<Uuid>,
        display_name: Option<String>,
    ) -> AppResult<ViewerSession> {
        // The store is authoritative: the stream may be live on another
        // instance with no local handle.
        let config = match self.live_config(creator_id).await? {
            Some(config) => config,
            None => return Err(AppError::StreamOffline),
        };

        let gate = ContentItem::live_gate(creator_id, &config);
        let decision = self.access.resolve_item(&gate, viewer).await?;
        if !decision.is_granted() {
            return Err(self.access.denial(decision, config.required_tier_id).await);
        }

        let backlog = self
            .stores
            .chat
            .recent_messages(creator_id, self.chat_history_limit)
            .await?;

        let (subscriber_id, rx) = self.registry.subscribe(creator_id).await;
        let key = presence_key(viewer);
        self.registry
            .track(creator_id, subscriber_id, key.clone())
            .await;

        Ok(ViewerSession {
            creator_id,
            viewer_id: viewer,
            display_name: display_name.unwrap_or_else(|| match viewer {
                Some(id) => id.to_string(),
                None => "guest".to_string(),
            }),
            presence_key: key,
            rx,
            backlog,
            subscriber_id,
        })
    }

    /// Deterministic teardown for one connection: untrack presence, then
    /// drop the registry subscription.
    pub async fn leave(&self, session: &ViewerSession) {
        self.registry
            .untrack(session.creator_id, session.subscriber_id)
            .await;
        self.registry
            .unsubscribe(session.creator_id, session.subscriber_id)
            .await;
    }

    /// Append a chat row and broadcast it. A failure is the sender's alone;
    /// nothing already rendered elsewhere is touched.
    pub async fn post_chat(
        &self,
        session: &ViewerSession,
        content: String,
    ) -> AppResult<LiveMessage> {
        self.post_message(session, content, MessageKind::Chat, None)
            .await
    }

    /// Append a tip-display row. This moves no money and feeds no ranking;
    /// the durable tip record is written by the payment confirmation path.
    pub async fn post_tip(
        &self,
        session: &ViewerSession,
        content: String,
        amount_cents: i64,
    ) -> AppResult<LiveMessage> {
        if amount_cents <= 0 {
            return Err(AppError::BadRequest("tip amount must be positive".into()));
        }
        self.post_message(session, content, MessageKind::Tip, Some(amount_cents))
            .await
    }

    async fn post_message(
        &self,
        session: &ViewerSession,
        content: String,
        kind: MessageKind,
        tip_amount_cents: Option<i64>,
    ) -> AppResult<LiveMessage> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("empty message".into()));
        }
        if self.live_config(session.creator_id).await?.is_none() {
            return Err(AppError::StreamOffline);
        }

        let message = self
            .stores
            .chat
            .append_message(NewLiveMessage {
                creator_id: session.creator_id,
                user_id: session.viewer_id,
                display_name: session.display_name.clone(),
                content,
                kind,
                tip_amount_cents,
            })
            .await?;

        crate::metrics::inc_chat_message(kind);
        self.broadcast(
            session.creator_id,
            ChannelEvent::MessageInserted {
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    /// Current ranking: the poll cache while live, the ledger directly once
    /// the stream is over.
    pub async fn leaderboard(&self, creator_id: Uuid) -> AppResult<Vec<Tipper>> {
        if let Some(handle) = self.streams.read().await.get(&creator_id) {
            return Ok(handle.leaderboard.current().await);
        }
        self.stores.tips.stream_leaderboard(creator_id).await
    }

    async fn live_config(&self, creator_id: Uuid) -> AppResult<Option<LiveAccessConfig>> {
        if let Some(handle) = self.streams.read().await.get(&creator_id) {
            return Ok(Some(handle.config));
        }
        self.stores.stream_state.live_profile(creator_id).await
    }

    async fn broadcast(&self, creator_id: Uuid, event: ChannelEvent) {
        self.registry.broadcast(creator_id, event.clone()).await;

        // Fanout failures are logged and swallowed: local delivery already
        // happened and the listener self-heals on resubscribe.
        if let Some(client) = &self.redis {
            if let Err(e) = fanout::publish(client, self.instance_id, creator_id, &event).await {
                tracing::warn!(%creator_id, error = %e, "fanout publish failed");
            }
        }
    }
}
