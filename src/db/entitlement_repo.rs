use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::EntitlementStore;
use crate::error::{AppError, AppResult};
use crate::models::{PurchaseRecord, SubscriptionRecord, SubscriptionStatus};

pub struct PgEntitlementRepo {
    pool: PgPool,
}

impl PgEntitlementRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    fan_id: Uuid,
    creator_id: Uuid,
    tier_id: Option<Uuid>,
    status: String,
    price_cents: i64,
    end_date: Option<DateTime<Utc>>,
    auto_renew: bool,
}

impl SubscriptionRow {
    fn into_model(self) -> AppResult<SubscriptionRecord> {
        let status = SubscriptionStatus::parse(&self.status)
            .ok_or_else(|| AppError::Database(format!("unknown subscription status {}", self.status)))?;
        Ok(SubscriptionRecord {
            id: self.id,
            fan_id: self.fan_id,
            creator_id: self.creator_id,
            tier_id: self.tier_id,
            status,
            price_cents: self.price_cents,
            end_date: self.end_date,
            auto_renew: self.auto_renew,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    user_id: Uuid,
    content_id: Uuid,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl EntitlementStore for PgEntitlementRepo {
    async fn subscriptions_for_fan(&self, fan_id: Uuid) -> AppResult<Vec<SubscriptionRecord>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, fan_id, creator_id, tier_id, status, price_cents, end_date, auto_renew
            FROM subscriptions
            WHERE fan_id = $1 AND status <> 'EXPIRED'
            "#,
        )
        .bind(fan_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubscriptionRow::into_model).collect()
    }

    async fn purchases_for_user(&self, user_id: Uuid) -> AppResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT user_id, content_id, created_at
            FROM purchases
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PurchaseRecord {
                user_id: r.user_id,
                content_id: r.content_id,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn confirm_purchase(&self, user_id: Uuid, content_id: Uuid) -> AppResult<()> {
        // Primary key (user_id, content_id) makes re-confirmation a no-op.
        sqlx::query(
            r#"
            INSERT INTO purchases (user_id, content_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, content_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(content_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
