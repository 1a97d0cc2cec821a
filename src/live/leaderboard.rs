//! Trusted tip leaderboard: periodic pull from the durable ledger.
//!
//! Deliberately decoupled from the chat broadcast path. Tip-display messages
//! are untrusted client-visible noise; replaying or spoofing them can never
//! move a ranking, because the ranking is recomputed only from ledger rows.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::TipLedger;
use crate::models::Tipper;

/// Last successfully fetched ranking for one live stream.
#[derive(Clone, Default)]
pub struct LeaderboardCache {
    inner: Arc<RwLock<Vec<Tipper>>>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Vec<Tipper> {
        self.inner.read().await.clone()
    }

    async fn replace(&self, ranking: Vec<Tipper>) {
        *self.inner.write().await = ranking;
    }

    /// One refresh cycle. A failed poll keeps the previous ranking; the
    /// viewer sees stale data rather than an error.
    pub async fn refresh(&self, creator_id: Uuid, tips: &dyn TipLedger) {
        match tips.stream_leaderboard(creator_id).await {
            Ok(ranking) => {
                self.replace(ranking).await;
                crate::metrics::inc_leaderboard_refresh(true);
            }
            Err(e) => {
                crate::metrics::inc_leaderboard_refresh(false);
                tracing::warn!(%creator_id, error = %e, "leaderboard poll failed; keeping last ranking");
            }
        }
    }
}

/// Spawn the poll task for one live stream. Aborted on stream end.
pub fn spawn_poller(
    creator_id: Uuid,
    tips: Arc<dyn TipLedger>,
    cache: LeaderboardCache,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            cache.refresh(creator_id, tips.as_ref()).await;
        }
    })
}
