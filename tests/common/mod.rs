//! In-memory stand-ins for the managed backend, used by the integration
//! tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use entitlement_service::db::{
    CatalogStore, EntitlementStore, LiveChatStore, NewLiveMessage, StreamStateStore, Stores,
    TipLedger,
};
use entitlement_service::error::{AppError, AppResult};
use entitlement_service::models::{
    ContentItem, LiveAccessConfig, LiveMessage, PurchaseRecord, SubscriptionRecord,
    SubscriptionStatus, TierDefinition, Tipper,
};

#[derive(Default)]
pub struct MemoryBackend {
    subscriptions: Mutex<Vec<SubscriptionRecord>>,
    purchases: Mutex<Vec<PurchaseRecord>>,
    tiers: Mutex<HashMap<Uuid, TierDefinition>>,
    content: Mutex<HashMap<Uuid, ContentItem>>,
    /// Durable tip ledger rows: (creator, user, display name, cents).
    tips: Mutex<Vec<(Uuid, Uuid, String, i64)>>,
    messages: Mutex<Vec<LiveMessage>>,
    live: Mutex<HashMap<Uuid, (bool, LiveAccessConfig)>>,
    fail_leaderboard: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            entitlements: self.clone(),
            catalog: self.clone(),
            tips: self.clone(),
            chat: self.clone(),
            stream_state: self.clone(),
        }
    }

    pub fn insert_tier(&self, creator_id: Uuid, price_cents: i64) -> TierDefinition {
        let tier = TierDefinition {
            id: Uuid::new_v4(),
            creator_id,
            name: format!("tier-{price_cents}"),
            price_cents,
            benefits: vec![],
            position: 0,
            active: true,
        };
        self.tiers.lock().unwrap().insert(tier.id, tier.clone());
        tier
    }

    pub fn retire_tier(&self, tier_id: Uuid) {
        if let Some(tier) = self.tiers.lock().unwrap().get_mut(&tier_id) {
            tier.active = false;
        }
    }

    pub fn insert_content(
        &self,
        creator_id: Uuid,
        price_cents: i64,
        tier_id: Option<Uuid>,
    ) -> ContentItem {
        let item = ContentItem {
            id: Uuid::new_v4(),
            creator_id,
            price_cents,
            tier_id,
        };
        self.content.lock().unwrap().insert(item.id, item.clone());
        item
    }

    pub fn insert_subscription(
        &self,
        fan_id: Uuid,
        creator_id: Uuid,
        tier_id: Option<Uuid>,
        status: SubscriptionStatus,
        end_in_days: i64,
        price_cents: i64,
    ) -> SubscriptionRecord {
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            fan_id,
            creator_id,
            tier_id,
            status,
            price_cents,
            end_date: Some(Utc::now() + Duration::days(end_in_days)),
            auto_renew: false,
        };
        self.subscriptions.lock().unwrap().push(record.clone());
        record
    }

    pub fn add_ledger_tip(&self, creator_id: Uuid, user_id: Uuid, name: &str, cents: i64) {
        self.tips
            .lock()
            .unwrap()
            .push((creator_id, user_id, name.to_string(), cents));
    }

    pub fn set_fail_leaderboard(&self, fail: bool) {
        self.fail_leaderboard.store(fail, Ordering::SeqCst);
    }

    pub fn message_count(&self, creator_id: Uuid) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.creator_id == creator_id)
            .count()
    }
}

#[async_trait]
impl EntitlementStore for MemoryBackend {
    async fn subscriptions_for_fan(&self, fan_id: Uuid) -> AppResult<Vec<SubscriptionRecord>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.fan_id == fan_id && s.status != SubscriptionStatus::Expired)
            .cloned()
            .collect())
    }

    async fn purchases_for_user(&self, user_id: Uuid) -> AppResult<Vec<PurchaseRecord>> {
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn confirm_purchase(&self, user_id: Uuid, content_id: Uuid) -> AppResult<()> {
        let mut purchases = self.purchases.lock().unwrap();
        let exists = purchases
            .iter()
            .any(|p| p.user_id == user_id && p.content_id == content_id);
        if !exists {
            purchases.push(PurchaseRecord {
                user_id,
                content_id,
                created_at: Utc::now(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryBackend {
    async fn content_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        Ok(self.content.lock().unwrap().get(&content_id).cloned())
    }

    async fn tier(&self, tier_id: Uuid) -> AppResult<Option<TierDefinition>> {
        Ok(self.tiers.lock().unwrap().get(&tier_id).cloned())
    }
}

#[async_trait]
impl TipLedger for MemoryBackend {
    async fn stream_leaderboard(&self, creator_id: Uuid) -> AppResult<Vec<Tipper>> {
        if self.fail_leaderboard.load(Ordering::SeqCst) {
            return Err(AppError::Database("ledger unavailable".into()));
        }

        let tips = self.tips.lock().unwrap();
        let mut totals: HashMap<Uuid, (String, i64)> = HashMap::new();
        for (creator, user, name, cents) in tips.iter() {
            if *creator != creator_id {
                continue;
            }
            let entry = totals.entry(*user).or_insert_with(|| (name.clone(), 0));
            entry.1 += cents;
        }

        let mut ranking: Vec<Tipper> = totals
            .into_iter()
            .map(|(user_id, (display_name, total_tipped_cents))| Tipper {
                user_id,
                display_name,
                total_tipped_cents,
            })
            .collect();
        ranking.sort_by(|a, b| b.total_tipped_cents.cmp(&a.total_tipped_cents));
        Ok(ranking)
    }
}

#[async_trait]
impl LiveChatStore for MemoryBackend {
    async fn append_message(&self, msg: NewLiveMessage) -> AppResult<LiveMessage> {
        let message = LiveMessage {
            id: Uuid::new_v4(),
            creator_id: msg.creator_id,
            user_id: msg.user_id,
            display_name: msg.display_name,
            content: msg.content,
            kind: msg.kind,
            tip_amount_cents: msg.tip_amount_cents,
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn recent_messages(&self, creator_id: Uuid, limit: i64) -> AppResult<Vec<LiveMessage>> {
        let messages = self.messages.lock().unwrap();
        let mut rows: Vec<LiveMessage> = messages
            .iter()
            .filter(|m| m.creator_id == creator_id)
            .cloned()
            .collect();
        let keep = rows.len().saturating_sub(limit as usize);
        Ok(rows.split_off(keep))
    }
}

#[async_trait]
impl StreamStateStore for MemoryBackend {
    async fn live_profile(&self, creator_id: Uuid) -> AppResult<Option<LiveAccessConfig>> {
        Ok(self
            .live
            .lock()
            .unwrap()
            .get(&creator_id)
            .filter(|(is_live, _)| *is_live)
            .map(|(_, config)| *config))
    }

    async fn set_live(&self, creator_id: Uuid, config: LiveAccessConfig) -> AppResult<()> {
        self.live.lock().unwrap().insert(creator_id, (true, config));
        Ok(())
    }

    async fn clear_chat_and_go_offline(&self, creator_id: Uuid) -> AppResult<()> {
        self.messages
            .lock()
            .unwrap()
            .retain(|m| m.creator_id != creator_id);
        if let Some(entry) = self.live.lock().unwrap().get_mut(&creator_id) {
            entry.0 = false;
        }
        Ok(())
    }
}
