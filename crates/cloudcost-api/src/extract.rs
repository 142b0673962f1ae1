use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, state::AppState};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity: the `X-User-Id` header, or the configured guest id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .map(|value| {
                value
                    .to_str()
                    .map_err(|_| ApiError::BadRequest("X-User-Id must be valid ASCII".to_string()))
            })
            .transpose()?
            .map(str::trim)
            .filter(|id| !id.is_empty());

        Ok(UserId(
            header
                .map(str::to_string)
                .unwrap_or_else(|| state.config.auth.guest_user_id.clone()),
        ))
    }
}
