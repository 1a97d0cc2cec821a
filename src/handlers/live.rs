//! Creator-facing stream lifecycle + the leaderboard read.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::User;
use crate::error::{AppError, AppResult};
use crate::models::LiveAccessConfig;
use crate::state::AppState;

pub async fn go_live(
    body: web::Json<LiveAccessConfig>,
    user: User,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let config = body.into_inner();

    if config.required_tier_id.is_some() && !config.requires_subscription {
        return Err(AppError::BadRequest(
            "required_tier_id needs requires_subscription".into(),
        ));
    }
    if let Some(tier_id) = config.required_tier_id {
        let tier = state
            .stores
            .catalog
            .tier(tier_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if tier.creator_id != user.id {
            return Err(AppError::BadRequest("tier belongs to another creator".into()));
        }
    }

    state.sessions.go_live(user.id, config).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn end_stream(user: User, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    state.sessions.end_stream(user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn leaderboard(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let creator_id = path.into_inner();
    let ranking = state.sessions.leaderboard(creator_id).await?;
    Ok(HttpResponse::Ok().json(ranking))
}
