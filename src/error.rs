use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::entitlement::resolver::DenyReason;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal server error")]
    Internal,

    #[error("stream is not live")]
    StreamOffline,

    #[error("stream is already live")]
    StreamAlreadyLive,

    #[error("access denied: {reason}")]
    AccessDenied {
        reason: DenyReason,
        /// Tier the lock screen should offer when the denial is tier-related.
        required_tier_id: Option<Uuid>,
        required_tier_price_cents: Option<i64>,
    },
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Transport(e.to_string())
    }
}

impl AppError {
    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Forbidden | AppError::AccessDenied { .. } => 403,
            AppError::NotFound | AppError::StreamOffline => 404,
            AppError::StreamAlreadyLive => 409,
            AppError::Transport(_) => 503,
            AppError::Config(_)
            | AppError::StartServer(_)
            | AppError::Database(_)
            | AppError::Internal => 500,
        }
    }

    fn error_body(&self) -> serde_json::Value {
        match self {
            AppError::AccessDenied {
                reason,
                required_tier_id,
                required_tier_price_cents,
            } => json!({
                "error": "access_denied",
                "reason": reason.as_str(),
                "required_tier_id": required_tier_id,
                "required_tier_price_cents": required_tier_price_cents,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = actix_web::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self.error_body())
    }
}
