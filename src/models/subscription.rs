use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Canceled => "CANCELED",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "CANCELED" => Some(SubscriptionStatus::Canceled),
            "EXPIRED" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

/// A fan's subscription to one creator.
///
/// Invariant (backend-enforced): at most one non-EXPIRED record per
/// `(fan_id, creator_id)` pair. A CANCELED record stays entitlement-valid
/// until `end_date` (grace period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub fan_id: Uuid,
    pub creator_id: Uuid,
    pub tier_id: Option<Uuid>,
    pub status: SubscriptionStatus,
    pub price_cents: i64,
    pub end_date: Option<DateTime<Utc>>,
    pub auto_renew: bool,
}

impl SubscriptionRecord {
    /// Whether this record currently grants entitlement.
    ///
    /// `auto_renew` is deliberately not consulted; only status and end_date
    /// matter.
    pub fn entitlement_valid(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Canceled => {
                matches!(self.end_date, Some(end) if end > now)
            }
            SubscriptionStatus::Expired => false,
        }
    }
}

/// One-time pay-per-view unlock. Created once on payment confirmation,
/// never mutated; a second purchase attempt is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub created_at: DateTime<Utc>,
}
