//! Identity extraction from trusted headers.
//!
//! Authentication (JWT verification, sessions) happens upstream; by the time
//! a request reaches this service, the gateway has stamped `x-user-id` and
//! `x-user-role` headers, which are taken on trust.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Identity, Role, UserId};
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, extracted from gateway headers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing x-user-id header".to_string()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|e| ApiError::Unauthorized(format!("invalid x-user-id header: {e}")))?;

        let role = match parts.headers.get("x-user-role") {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.parse::<Role>().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized("invalid x-user-role header".to_string())
                })?,
            None => Role::User,
        };

        Ok(CurrentUser(Identity {
            user: UserId::from_uuid(user_id),
            role,
        }))
    }
}
