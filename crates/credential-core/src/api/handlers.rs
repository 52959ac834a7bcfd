//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::gate::RequestIdentity;
use crate::{Account, LoginRequest, RegisterRequest, UpdateAccountRequest};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Account,
}

/// Token facts plus display fields read fresh from the store.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub identity: RequestIdentity,
    pub name: String,
    pub email: String,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text())))
}

pub(super) async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let request = json_body(payload)?;
    let account = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub(super) async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(payload)?;
    let result = state
        .auth_service
        .authenticate_password(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: result.token,
        expires_at: result.expires_at,
        user: result.account,
    }))
}

pub(super) async fn me(
    State(state): State<ApiState>,
    identity: RequestIdentity,
) -> Result<Json<MeResponse>, ApiError> {
    let account = state.auth_service.get_account(identity.subject_id).await?;

    Ok(Json(MeResponse {
        identity,
        name: account.name,
        email: account.email,
    }))
}

pub(super) async fn list_users(State(state): State<ApiState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.auth_service.list_accounts().await?))
}

pub(super) async fn update_user(
    State(state): State<ApiState>,
    identity: RequestIdentity,
    Path(id): Path<u64>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let update = json_body(payload)?;
    tracing::info!(
        admin_id = identity.subject_id,
        account_id = id,
        elevated = ?update.elevated,
        "Admin updating account"
    );

    Ok(Json(state.auth_service.update_account(id, update).await?))
}
