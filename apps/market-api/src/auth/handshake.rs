//! Connection authentication for the WebSocket handshake.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::auth::principal::Principal;
use crate::auth::tokens::TokenVerifier;
use crate::error::ApiError;

/// Pull the bearer token from an `Authorization: Bearer <token>` header.
///
/// Returns `Err` with a client-facing message when the header is present
/// but malformed, `Ok(None)` when it is absent.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| Some(t.trim()))
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

/// Authenticate a handshake. The `auth` token (sent as the `token` query
/// parameter by browser clients) wins over the `Authorization` header.
///
/// Runs once per connection before any room is joined; on failure the
/// upgrade is refused and nothing else happens.
pub fn authenticate(
    verifier: &TokenVerifier,
    auth_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    let token = match auth_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t,
        None => bearer_from_headers(headers)?
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Authentication token missing"))?,
    };
    verifier.verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use market_common::Role;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new("handshake-secret")
    }

    fn token_for(role: Role) -> String {
        verifier()
            .mint(&Principal::new("usr_h", role), Duration::minutes(5))
            .unwrap()
    }

    #[test]
    fn accepts_auth_field_token() {
        let token = token_for(Role::Customer);
        let p = authenticate(&verifier(), Some(&token), &HeaderMap::new()).unwrap();
        assert_eq!(p, Principal::Customer { id: "usr_h".into() });
    }

    #[test]
    fn accepts_bearer_header() {
        let token = token_for(Role::Seller);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let p = authenticate(&verifier(), None, &headers).unwrap();
        assert_eq!(p.role(), Role::Seller);
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = authenticate(&verifier(), None, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.message, "Authentication token missing");

        let err = authenticate(&verifier(), Some("  "), &HeaderMap::new()).unwrap_err();
        assert_eq!(err.message, "Authentication token missing");
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(authenticate(&verifier(), None, &headers).is_err());
    }

    #[test]
    fn invalid_token_is_rejected() {
        assert!(authenticate(&verifier(), Some("bogus"), &HeaderMap::new()).is_err());
    }
}
