//! Registration and login endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use service::NewAccount;

use crate::{
    error::ApiResult,
    models::{
        validate_email, validate_password, AccountResponse, AuthResponse, LoginRequest,
        RegisterRequest,
    },
    principal::CurrentPrincipal,
    AppState,
};

/// Register a new account
///
/// POST /auth/register
///
/// The caller's principal is passed through so the service can gate admin
/// registration; an anonymous caller registering a regular account is the
/// normal path.
pub async fn register(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let account = state
        .identity
        .register(
            &caller,
            NewAccount {
                email: body.email,
                secret: body.password,
                role: body.role,
            },
        )
        .await?;

    info!(account_id = %account.id, "registration completed");
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Exchange credentials for a bearer token
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let session = state
        .identity
        .authenticate(&body.email, &body.password)
        .await?;

    Ok(Json(AuthResponse {
        token: session.token,
        user_id: session.account_id,
        expires_at: session.expires_at,
    }))
}
