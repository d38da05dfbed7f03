//! Account endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use service::AccountUpdate;

use crate::{
    error::ApiResult,
    models::{
        validate_email, validate_password, AccountListResponse, AccountResponse, DeleteResponse,
        UpdateUserRequest,
    },
    principal::CurrentPrincipal,
    AppState,
};

/// List all accounts (admin only)
///
/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
) -> ApiResult<impl IntoResponse> {
    let accounts = state.identity.list_accounts(&caller).await?;
    Ok(Json(AccountListResponse {
        users: accounts.into_iter().map(AccountResponse::from).collect(),
    }))
}

/// Fetch a single account
///
/// GET /users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let account = state.identity.get_account(&caller, user_id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Update an account's profile
///
/// PUT /users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(email) = &body.email {
        validate_email(email)?;
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
    }

    let account = state
        .identity
        .update_account(
            &caller,
            user_id,
            AccountUpdate {
                email: body.email,
                secret: body.password,
                role: body.role,
            },
        )
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// Delete an account and everything it owns
///
/// DELETE /users/:user_id
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentPrincipal(caller): CurrentPrincipal,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.identity.delete_account(&caller, user_id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}
