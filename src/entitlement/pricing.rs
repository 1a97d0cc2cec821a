//! Pricing negotiation for subscribe / upgrade / downgrade actions.
//!
//! Pure function over the viewer's current subscription and the target tier;
//! recomputed whenever the subscription map changes, never cached across a
//! session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SubscriptionRecord, SubscriptionStatus, TierDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    New,
    Upgrade,
    Downgrade,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingQuote {
    pub kind: ChangeKind,
    pub amount_due_cents: i64,
    /// Set only for deferred changes: a downgrade takes effect at the next
    /// billing boundary, never mid-period, to avoid partial refunds.
    pub effective_at: Option<DateTime<Utc>>,
}

/// Compute the amount payable when a viewer subscribes to `target`.
///
/// - no current ACTIVE subscription -> NEW at full price
/// - same tier -> NOOP (selection is disabled upstream)
/// - more expensive tier -> UPGRADE, charged the difference immediately so
///   the already-paid period is not double-billed
/// - cheaper tier -> DOWNGRADE, nothing due now, deferred to `end_date`
///
/// An equal-price switch to a different tier quotes UPGRADE with zero due:
/// nothing extra is owed and no refund is needed, so it applies immediately.
pub fn negotiate(
    target: &TierDefinition,
    current: Option<(&SubscriptionRecord, &TierDefinition)>,
) -> PricingQuote {
    let Some((subscription, current_tier)) = current else {
        return PricingQuote {
            kind: ChangeKind::New,
            amount_due_cents: target.price_cents,
            effective_at: None,
        };
    };

    // Canceled-in-grace and expired records do not discount a fresh signup.
    if subscription.status != SubscriptionStatus::Active {
        return PricingQuote {
            kind: ChangeKind::New,
            amount_due_cents: target.price_cents,
            effective_at: None,
        };
    }

    if current_tier.id == target.id {
        return PricingQuote {
            kind: ChangeKind::Noop,
            amount_due_cents: 0,
            effective_at: None,
        };
    }

    if target.price_cents >= current_tier.price_cents {
        PricingQuote {
            kind: ChangeKind::Upgrade,
            amount_due_cents: target.price_cents - current_tier.price_cents,
            effective_at: None,
        }
    } else {
        PricingQuote {
            kind: ChangeKind::Downgrade,
            amount_due_cents: 0,
            effective_at: subscription.end_date,
        }
    }
}
