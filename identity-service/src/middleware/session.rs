//! Session guard: resolves a bearer token to the current account and role.
//!
//! Resolution is read-only; expiry is never extended (no sliding
//! expiration). Expired sessions are removed lazily when encountered.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::Role;
use crate::AppState;

/// Resolved caller identity, inserted into request extensions by the guard.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account_id: Uuid,
    pub role: Role,
}

/// Require a valid session on every request passing through. Fails closed
/// with `Unauthenticated` before the inner handler runs.
pub async fn session_guard_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ServiceError::Unauthenticated)?;

    let session = state
        .store
        .find_session(token)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::Unauthenticated)?;

    if session.is_expired() {
        state
            .store
            .remove_session(token)
            .await
            .map_err(ServiceError::from)?;
        return Err(ServiceError::Unauthenticated);
    }

    // The owning account must still exist; a session that outlived its
    // account is revoked on sight.
    let account = match state
        .store
        .find_account(session.account_id)
        .await
        .map_err(ServiceError::from)?
    {
        Some(account) => account,
        None => {
            state
                .store
                .remove_session(token)
                .await
                .map_err(ServiceError::from)?;
            return Err(ServiceError::Unauthenticated);
        }
    };

    req.extensions_mut().insert(CurrentUser {
        account_id: account.account_id,
        role: account.role,
    });

    Ok(next.run(req).await)
}

/// Require the resolved role to be admin. Layered inside the session guard;
/// a valid non-admin session gets `Forbidden`, distinct from the guard's
/// `Unauthenticated`.
pub async fn require_admin_middleware(req: Request, next: Next) -> Result<Response, ServiceError> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ServiceError::Unauthenticated)?;

    if current.role != Role::Admin {
        tracing::warn!(account_id = %current.account_id, "Admin operation refused for non-admin role");
        return Err(ServiceError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthenticated.into_response())
    }
}
