//! The pure entitlement decision function.
//!
//! Used identically for feed posts and live broadcast gates. No I/O, no
//! caching: price, tier, or subscription changes are reflected on the next
//! call against a fresh ledger snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ledger::EntitlementLedger;
use crate::models::ContentItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    Owner,
    Public,
    Purchased,
    Subscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotSubscribed,
    SubscriptionLapsed,
    TierMismatch,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotSubscribed => "not_subscribed",
            DenyReason::SubscriptionLapsed => "subscription_lapsed",
            DenyReason::TierMismatch => "tier_mismatch",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(GrantReason),
    Denied(DenyReason),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }
}

/// Resolve whether `viewer` may see `content`, given the viewer's ledger
/// snapshot.
///
/// First match wins; the order is load-bearing:
/// 1. owner bypass
/// 2. public content
/// 3. already purchased
/// 4. subscription (grace period included, tier checked)
/// 5. deny
///
/// Anonymous viewers trivially skip 1 and 3. Any ambiguity fails closed.
pub fn resolve(
    content: &ContentItem,
    viewer: Option<Uuid>,
    ledger: &EntitlementLedger,
    now: DateTime<Utc>,
) -> AccessDecision {
    if viewer == Some(content.creator_id) {
        return AccessDecision::Granted(GrantReason::Owner);
    }

    if content.is_public() {
        return AccessDecision::Granted(GrantReason::Public);
    }

    if viewer.is_some() && ledger.has_purchased(content.id) {
        return AccessDecision::Granted(GrantReason::Purchased);
    }

    let Some(subscription) = ledger.subscription_for(content.creator_id) else {
        return AccessDecision::Denied(DenyReason::NotSubscribed);
    };

    if !subscription.entitlement_valid(now) {
        return AccessDecision::Denied(DenyReason::SubscriptionLapsed);
    }

    match content.tier_id {
        // Any-tier content: every valid subscriber qualifies.
        None => AccessDecision::Granted(GrantReason::Subscribed),
        Some(required) if subscription.tier_id == Some(required) => {
            AccessDecision::Granted(GrantReason::Subscribed)
        }
        Some(_) => AccessDecision::Denied(DenyReason::TierMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubscriptionRecord, SubscriptionStatus};
    use chrono::Duration;

    fn content(creator: Uuid, price_cents: i64, tier_id: Option<Uuid>) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            creator_id: creator,
            price_cents,
            tier_id,
        }
    }

    fn ledger_with(sub: SubscriptionRecord) -> EntitlementLedger {
        let mut ledger = EntitlementLedger::for_viewer(sub.fan_id);
        ledger.replace(vec![sub], vec![]);
        ledger
    }

    fn subscription(
        fan: Uuid,
        creator: Uuid,
        tier: Option<Uuid>,
        status: SubscriptionStatus,
        end_in_days: i64,
    ) -> SubscriptionRecord {
        SubscriptionRecord {
            id: Uuid::new_v4(),
            fan_id: fan,
            creator_id: creator,
            tier_id: tier,
            status,
            price_cents: 999,
            end_date: Some(Utc::now() + Duration::days(end_in_days)),
            auto_renew: false,
        }
    }

    #[test]
    fn owner_always_granted() {
        let creator = Uuid::new_v4();
        let item = content(creator, 2500, Some(Uuid::new_v4()));
        let decision = resolve(&item, Some(creator), &EntitlementLedger::anonymous(), Utc::now());
        assert_eq!(decision, AccessDecision::Granted(GrantReason::Owner));
    }

    #[test]
    fn public_content_granted_to_anonymous() {
        let item = content(Uuid::new_v4(), 0, None);
        let decision = resolve(&item, None, &EntitlementLedger::anonymous(), Utc::now());
        assert_eq!(decision, AccessDecision::Granted(GrantReason::Public));
    }

    #[test]
    fn anonymous_denied_gated_content() {
        let item = content(Uuid::new_v4(), 500, None);
        let decision = resolve(&item, None, &EntitlementLedger::anonymous(), Utc::now());
        assert_eq!(decision, AccessDecision::Denied(DenyReason::NotSubscribed));
    }

    #[test]
    fn purchase_unlocks_ppv() {
        let viewer = Uuid::new_v4();
        let item = content(Uuid::new_v4(), 500, None);
        let mut ledger = EntitlementLedger::for_viewer(viewer);
        ledger.record_purchase(item.id);

        let decision = resolve(&item, Some(viewer), &ledger, Utc::now());
        assert_eq!(decision, AccessDecision::Granted(GrantReason::Purchased));
    }

    #[test]
    fn canceled_in_grace_grants_matching_tier_only() {
        let fan = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let tier = Uuid::new_v4();
        let other_tier = Uuid::new_v4();
        let ledger = ledger_with(subscription(
            fan,
            creator,
            Some(tier),
            SubscriptionStatus::Canceled,
            1,
        ));
        let now = Utc::now();

        let same = content(creator, 0, Some(tier));
        assert!(resolve(&same, Some(fan), &ledger, now).is_granted());

        let mismatched = content(creator, 0, Some(other_tier));
        assert_eq!(
            resolve(&mismatched, Some(fan), &ledger, now),
            AccessDecision::Denied(DenyReason::TierMismatch)
        );
    }

    #[test]
    fn expired_grace_behaves_like_no_subscription() {
        let fan = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let ledger = ledger_with(subscription(
            fan,
            creator,
            None,
            SubscriptionStatus::Canceled,
            -1,
        ));

        let item = content(creator, 500, None);
        assert_eq!(
            resolve(&item, Some(fan), &ledger, Utc::now()),
            AccessDecision::Denied(DenyReason::SubscriptionLapsed)
        );
    }

    #[test]
    fn any_tier_content_unlocked_by_any_valid_subscription() {
        let fan = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let ledger = ledger_with(subscription(
            fan,
            creator,
            Some(Uuid::new_v4()),
            SubscriptionStatus::Active,
            30,
        ));

        let item = content(creator, 500, None);
        assert!(resolve(&item, Some(fan), &ledger, Utc::now()).is_granted());
    }

    #[test]
    fn canceled_without_end_date_fails_closed() {
        let fan = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let mut sub = subscription(fan, creator, None, SubscriptionStatus::Canceled, 10);
        sub.end_date = None;
        let ledger = ledger_with(sub);

        let item = content(creator, 500, None);
        assert_eq!(
            resolve(&item, Some(fan), &ledger, Utc::now()),
            AccessDecision::Denied(DenyReason::SubscriptionLapsed)
        );
    }
}
