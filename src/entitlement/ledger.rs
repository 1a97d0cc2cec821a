use chrono::Utc;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::{PurchaseRecord, SubscriptionRecord, SubscriptionStatus};

/// Snapshot of one viewer's entitlement-relevant state: subscriptions keyed
/// by creator and one-time purchases keyed by content id.
///
/// The ledger is owned by the viewing session and updated only through
/// [`replace`](Self::replace) (wholesale refresh) and
/// [`record_purchase`](Self::record_purchase) (append on confirmed payment),
/// so the resolver never observes a half-updated state.
#[derive(Debug, Clone, Default)]
pub struct EntitlementLedger {
    viewer_id: Option<Uuid>,
    subscriptions: HashMap<Uuid, SubscriptionRecord>,
    purchases: HashSet<Uuid>,
}

impl EntitlementLedger {
    /// Ledger for an anonymous viewer: no subscriptions, no purchases.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_viewer(viewer_id: Uuid) -> Self {
        Self {
            viewer_id: Some(viewer_id),
            ..Self::default()
        }
    }

    pub fn viewer_id(&self) -> Option<Uuid> {
        self.viewer_id
    }

    /// Atomically replace both collections from a backend refresh.
    ///
    /// EXPIRED rows are dropped on ingest. If the backend ever returns more
    /// than one non-expired row for the same creator (an invariant
    /// violation), the entitlement-valid row wins, then the one with the
    /// latest end_date.
    pub fn replace(
        &mut self,
        subscriptions: Vec<SubscriptionRecord>,
        purchases: Vec<PurchaseRecord>,
    ) {
        let now = Utc::now();
        let mut by_creator: HashMap<Uuid, SubscriptionRecord> = HashMap::new();

        for sub in subscriptions {
            if sub.status == SubscriptionStatus::Expired {
                continue;
            }
            match by_creator.get(&sub.creator_id) {
                Some(existing) => {
                    let keep_new = match (
                        sub.entitlement_valid(now),
                        existing.entitlement_valid(now),
                    ) {
                        (true, false) => true,
                        (false, true) => false,
                        _ => sub.end_date > existing.end_date,
                    };
                    if keep_new {
                        by_creator.insert(sub.creator_id, sub);
                    }
                }
                None => {
                    by_creator.insert(sub.creator_id, sub);
                }
            }
        }

        self.subscriptions = by_creator;
        self.purchases = purchases.into_iter().map(|p| p.content_id).collect();
    }

    pub fn subscription_for(&self, creator_id: Uuid) -> Option<&SubscriptionRecord> {
        self.subscriptions.get(&creator_id)
    }

    pub fn has_purchased(&self, content_id: Uuid) -> bool {
        self.purchases.contains(&content_id)
    }

    /// Append a confirmed purchase. Idempotent: returns false when the item
    /// was already unlocked.
    pub fn record_purchase(&mut self, content_id: Uuid) -> bool {
        self.purchases.insert(content_id)
    }

    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }
}
