//! Admin roster handlers. All routes here are layered with the session guard
//! plus the admin role requirement; an unauthorized call never reaches the
//! mutation below it.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{AccountResponse, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Full roster, newest-created first.
///
/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, ServiceError> {
    let accounts = state.admin.list_users().await?;
    Ok(Json(accounts.iter().map(|a| a.sanitized()).collect()))
}

/// Change a user's role. The role string is parsed against the closed enum
/// before the store is touched, so an invalid role leaves the target intact.
///
/// PATCH /admin/users/:account_id/role
pub async fn update_role(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<StatusCode, ServiceError> {
    let role = Role::parse(&req.role)
        .ok_or_else(|| ServiceError::Validation(format!("Invalid role: {}", req.role)))?;

    state.admin.set_role(account_id, role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user and cascade-invalidate their sessions and any pending
/// challenge.
///
/// DELETE /admin/users/:account_id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.admin.delete_user(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
