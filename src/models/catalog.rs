use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::live::LiveAccessConfig;

/// A named subscription level, scoped to one creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDefinition {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub benefits: Vec<String>,
    pub position: i32,
    pub active: bool,
}

/// A gated piece of content (feed post or the synthetic gate of a live
/// broadcast).
///
/// Gating encoding:
/// - `tier_id = None, price_cents = 0`  -> fully public
/// - `tier_id = None, price_cents > 0`  -> pay-per-view, also unlocked for
///   any valid subscriber regardless of tier
/// - `tier_id = Some(t)`                -> unlocked for subscribers of `t`,
///   or via pay-per-view when `price_cents > 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub price_cents: i64,
    pub tier_id: Option<Uuid>,
}

impl ContentItem {
    pub fn is_public(&self) -> bool {
        self.price_cents == 0 && self.tier_id.is_none()
    }

    /// Synthetic item representing a live broadcast's gate, evaluated by the
    /// same resolver as feed content.
    ///
    /// The subscriber-only-any-tier case uses a nonzero price purely to keep
    /// the item out of the public arm; the synthetic id never appears in any
    /// purchase set, so only the subscription arm can grant.
    pub fn live_gate(creator_id: Uuid, config: &LiveAccessConfig) -> Self {
        let (price_cents, tier_id) = if !config.requires_subscription {
            (0, None)
        } else {
            match config.required_tier_id {
                Some(tier) => (0, Some(tier)),
                None => (1, None),
            }
        };

        Self {
            id: Uuid::new_v4(),
            creator_id,
            price_cents,
            tier_id,
        }
    }
}
