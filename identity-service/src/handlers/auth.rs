//! Authentication handlers: sign-up, sign-in, OTP verification, sign-out.

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ServiceError;
use crate::middleware::CurrentUser;
use crate::models::AccountResponse;
use crate::services::ChallengeHandle;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 2, message = "Full name must be at least 2 characters"))]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    pub account_id: Uuid,
    pub challenge_id: Uuid,
    #[validate(length(min = 1, message = "Code must not be empty"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
    /// Seconds until the session expires.
    pub expires_in: i64,
    pub account: AccountResponse,
}

/// Start sign-up. Returns a pending-challenge handle; the code itself only
/// travels through the OTP channel.
///
/// POST /auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<ChallengeHandle>), ServiceError> {
    req.validate()?;
    let handle = state.identity.sign_up(&req.email, &req.full_name).await?;
    Ok((StatusCode::ACCEPTED, Json(handle)))
}

/// Start sign-in for an existing account.
///
/// POST /auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<(StatusCode, Json<ChallengeHandle>), ServiceError> {
    req.validate()?;
    let handle = state.identity.sign_in(&req.email).await?;
    Ok((StatusCode::ACCEPTED, Json(handle)))
}

/// Verify the submitted code and establish a session.
///
/// POST /auth/verify
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ServiceError> {
    req.validate()?;

    let session = state
        .identity
        .verify(req.account_id, req.challenge_id, &req.code)
        .await?;

    let account = state
        .store
        .find_account(session.account_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

    Ok(Json(VerifyResponse {
        expires_in: (session.expires_utc - session.issued_utc).num_seconds(),
        token: session.token,
        account: account.sanitized(),
    }))
}

/// Invalidate the presented session token. Idempotent: an absent or unknown
/// token still yields 204, so this route sits outside the session guard.
///
/// POST /auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ServiceError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        state.identity.sign_out(token).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Current account for the authenticated caller.
///
/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state
        .store
        .find_account(current.account_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::Unauthenticated)?;

    Ok(Json(account.sanitized()))
}
