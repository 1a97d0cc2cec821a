//! Ledger refresh + entitlement/pricing orchestration.
//!
//! The resolver and negotiator stay pure; this service owns the I/O around
//! them: building a fresh ledger snapshot from the backend, turning denials
//! into lock-screen payloads, and recording confirmed purchases.

use chrono::Utc;
use uuid::Uuid;

use crate::db::Stores;
use crate::entitlement::{negotiate, resolve, AccessDecision, EntitlementLedger, PricingQuote};
use crate::error::{AppError, AppResult};
use crate::models::ContentItem;

#[derive(Clone)]
pub struct AccessService {
    stores: Stores,
}

impl AccessService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Build a fresh ledger snapshot for a viewer. Both collections are
    /// fetched and applied wholesale; the resolver never sees a partial
    /// refresh.
    pub async fn load_ledger(&self, viewer: Option<Uuid>) -> AppResult<EntitlementLedger> {
        let Some(viewer_id) = viewer else {
            return Ok(EntitlementLedger::anonymous());
        };

        let subscriptions = self
            .stores
            .entitlements
            .subscriptions_for_fan(viewer_id)
            .await?;
        let purchases = self
            .stores
            .entitlements
            .purchases_for_user(viewer_id)
            .await?;

        let mut ledger = EntitlementLedger::for_viewer(viewer_id);
        ledger.replace(subscriptions, purchases);
        Ok(ledger)
    }

    /// Resolve access to an item against a fresh ledger.
    pub async fn resolve_item(
        &self,
        content: &ContentItem,
        viewer: Option<Uuid>,
    ) -> AppResult<AccessDecision> {
        let ledger = self.load_ledger(viewer).await?;
        let decision = resolve(content, viewer, &ledger, Utc::now());
        crate::metrics::inc_access_decision(&decision);
        Ok(decision)
    }

    /// Resolve a stored content item by id.
    pub async fn resolve_content(
        &self,
        content_id: Uuid,
        viewer: Option<Uuid>,
    ) -> AppResult<(ContentItem, AccessDecision)> {
        let content = self
            .stores
            .catalog
            .content_item(content_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let decision = self.resolve_item(&content, viewer).await?;
        Ok((content, decision))
    }

    /// Convert a denial into the error the Access Gate renders: the deny
    /// reason plus the tier (and price) the upgrade prompt should offer.
    pub async fn denial(
        &self,
        decision: AccessDecision,
        required_tier_id: Option<Uuid>,
    ) -> AppError {
        let AccessDecision::Denied(reason) = decision else {
            return AppError::Internal;
        };

        let mut price = None;
        if let Some(tier_id) = required_tier_id {
            match self.stores.catalog.tier(tier_id).await {
                Ok(Some(tier)) => price = Some(tier.price_cents),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%tier_id, error = %e, "tier lookup for lock screen failed");
                }
            }
        }

        AppError::AccessDenied {
            reason,
            required_tier_id,
            required_tier_price_cents: price,
        }
    }

    /// Price a subscribe/upgrade/downgrade action against the viewer's
    /// current subscription state.
    pub async fn quote(&self, viewer: Uuid, tier_id: Uuid) -> AppResult<PricingQuote> {
        let target = self
            .stores
            .catalog
            .tier(tier_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !target.active {
            return Err(AppError::BadRequest("tier is not open for signup".into()));
        }

        let ledger = self.load_ledger(Some(viewer)).await?;
        let current = ledger.subscription_for(target.creator_id);

        let current_pair = match current {
            Some(sub) => match sub.tier_id {
                Some(current_tier_id) => self
                    .stores
                    .catalog
                    .tier(current_tier_id)
                    .await?
                    .map(|tier| (sub.clone(), tier)),
                // Legacy any-tier subscription with no tier row: price the
                // target as a fresh signup.
                None => None,
            },
            None => None,
        };

        Ok(match &current_pair {
            Some((sub, tier)) => negotiate(&target, Some((sub, tier))),
            None => negotiate(&target, None),
        })
    }

    /// Record a confirmed pay-per-view purchase. Idempotent end to end: the
    /// store upsert is a no-op for an already-purchased item.
    pub async fn confirm_purchase(&self, viewer: Uuid, content_id: Uuid) -> AppResult<()> {
        let content = self
            .stores
            .catalog
            .content_item(content_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if content.price_cents == 0 {
            return Err(AppError::BadRequest("content is not pay-per-view".into()));
        }

        self.stores
            .entitlements
            .confirm_purchase(viewer, content_id)
            .await
    }
}
