//! Access Gate boundary: entitlement checks, pricing quotes, purchase
//! confirmation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{MaybeUser, User};
use crate::entitlement::{AccessDecision, DenyReason, GrantReason};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_reason: Option<GrantReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_reason: Option<DenyReason>,
    /// Lock-screen payload: the tier the upgrade prompt should offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_tier_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_tier_price_cents: Option<i64>,
}

pub async fn content_access(
    path: web::Path<Uuid>,
    viewer: MaybeUser,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    let (content, decision) = state.access.resolve_content(content_id, viewer.0).await?;

    let response = match decision {
        AccessDecision::Granted(reason) => AccessResponse {
            granted: true,
            grant_reason: Some(reason),
            deny_reason: None,
            required_tier_id: None,
            required_tier_price_cents: None,
        },
        AccessDecision::Denied(reason) => {
            let mut required_tier_price_cents = None;
            if let Some(tier_id) = content.tier_id {
                required_tier_price_cents = state
                    .stores
                    .catalog
                    .tier(tier_id)
                    .await?
                    .map(|t| t.price_cents);
            }
            AccessResponse {
                granted: false,
                grant_reason: None,
                deny_reason: Some(reason),
                required_tier_id: content.tier_id,
                required_tier_price_cents,
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub tier_id: Uuid,
}

pub async fn subscription_quote(
    path: web::Path<Uuid>,
    body: web::Json<QuoteRequest>,
    user: User,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let creator_id = path.into_inner();

    let tier = state
        .stores
        .catalog
        .tier(body.tier_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if tier.creator_id != creator_id {
        return Err(AppError::BadRequest(
            "tier does not belong to this creator".into(),
        ));
    }

    let quote = state.access.quote(user.id, body.tier_id).await?;
    Ok(HttpResponse::Ok().json(quote))
}

pub async fn confirm_purchase(
    path: web::Path<Uuid>,
    user: User,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    state.access.confirm_purchase(user.id, content_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
