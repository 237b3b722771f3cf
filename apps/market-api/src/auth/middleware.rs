//! Bearer token extraction for REST routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::handshake::bearer_from_headers;
use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_from_headers(&parts.headers)?
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        state.tokens.verify(token).map(AuthUser)
    }
}
