use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::CatalogStore;
use crate::error::AppResult;
use crate::models::{ContentItem, TierDefinition};

pub struct PgCatalogRepo {
    pool: PgPool,
}

impl PgCatalogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    id: Uuid,
    creator_id: Uuid,
    price_cents: i64,
    tier_id: Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct TierRow {
    id: Uuid,
    creator_id: Uuid,
    name: String,
    price_cents: i64,
    benefits: Vec<String>,
    position: i32,
    active: bool,
}

#[async_trait]
impl CatalogStore for PgCatalogRepo {
    async fn content_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, creator_id, price_cents, tier_id
            FROM content_items
            WHERE id = $1
            "#,
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ContentItem {
            id: r.id,
            creator_id: r.creator_id,
            price_cents: r.price_cents,
            tier_id: r.tier_id,
        }))
    }

    async fn tier(&self, tier_id: Uuid) -> AppResult<Option<TierDefinition>> {
        let row = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT id, creator_id, name, price_cents, benefits, position, active
            FROM tiers
            WHERE id = $1
            "#,
        )
        .bind(tier_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TierDefinition {
            id: r.id,
            creator_id: r.creator_id,
            name: r.name,
            price_cents: r.price_cents,
            benefits: r.benefits,
            position: r.position,
            active: r.active,
        }))
    }
}
