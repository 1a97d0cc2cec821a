//! Gateway-forwarded identity.
//!
//! Authentication happens at the API gateway; this service trusts the
//! forwarded `x-user-id` header. `User` rejects anonymous callers,
//! `MaybeUser` admits them (public content is viewable signed out).

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

fn forwarded_user(req: &HttpRequest) -> Result<Option<Uuid>, AppError> {
    match req.headers().get(USER_ID_HEADER) {
        None => Ok(None),
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| AppError::BadRequest("malformed x-user-id header".into()))?;
            Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| AppError::BadRequest("malformed x-user-id header".into()))
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct User {
    pub id: Uuid,
}

impl FromRequest for User {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(match forwarded_user(req) {
            Ok(Some(id)) => Ok(User { id }),
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => Err(e),
        })
    }
}

/// A possibly-anonymous caller.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(forwarded_user(req).map(MaybeUser))
    }
}
