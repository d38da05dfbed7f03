//! Request-scoped principal resolution.
//!
//! Every API route runs behind [`resolve_principal`]. A request without an
//! `Authorization` header proceeds as [`Principal::Anonymous`] and lets the
//! service layer decide whether the operation needs an identity; a request
//! that does present a credential must present a valid one, so a malformed
//! header, a bad signature, or an expired token ends the request with 401
//! before any handler runs.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use authn::VerifyError;
use authz::Principal;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Extract the bearer token from an `Authorization` header value.
///
/// `None` means the header was absent entirely; an ill-formed header is an
/// error rather than anonymity, so a client that tried to authenticate
/// never silently loses its identity.
pub fn bearer_token(header: Option<&str>) -> ApiResult<Option<&str>> {
    let Some(value) = header else {
        return Ok(None);
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(Some(token)),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Middleware that turns the `Authorization` header into a [`Principal`]
/// stored in request extensions.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    // A header value that is not even UTF-8 is a malformed credential,
    // not anonymity.
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| ApiError::Unauthorized))
        .transpose()?;

    let principal = match bearer_token(header)? {
        None => Principal::Anonymous,
        Some(token) => match state.tokens.verify(token, Utc::now()) {
            Ok(claims) => {
                debug!(account_id = %claims.sub, "resolved principal");
                Principal::authenticated(claims.sub, claims.role)
            }
            Err(VerifyError::Expired) => {
                warn!("rejected expired token");
                return Err(ApiError::Unauthorized);
            }
            Err(VerifyError::BadSignature) => {
                warn!("rejected token with bad signature");
                return Err(ApiError::Unauthorized);
            }
        },
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor handing the resolved [`Principal`] to handlers.
///
/// Falls back to anonymous when the middleware did not run, as in handler
/// unit tests that build requests directly.
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .copied()
            .unwrap_or(Principal::Anonymous);
        Ok(CurrentPrincipal(principal))
    }
}
