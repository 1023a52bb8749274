pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::IdentityConfig;
use crate::error::ServiceError;
use crate::services::{AdminService, IdentityService};
use crate::store::AccountStore;

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub store: Arc<dyn AccountStore>,
    pub identity: IdentityService,
    pub admin: AdminService,
}

pub fn build_router(state: AppState) -> Router {
    // Admin roster routes: session guard first, then the admin role gate.
    let admin_routes = Router::new()
        .route("/admin/users", get(handlers::admin::list_users))
        .route(
            "/admin/users/:account_id/role",
            patch(handlers::admin::update_role),
        )
        .route(
            "/admin/users/:account_id",
            delete(handlers::admin::delete_user),
        )
        .layer(from_fn(middleware::require_admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_guard_middleware,
        ));

    let guarded_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_guard_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/sign-up", post(handlers::auth::sign_up))
        .route("/auth/sign-in", post(handlers::auth::sign_in))
        .route("/auth/verify", post(handlers::auth::verify))
        .route("/auth/sign-out", post(handlers::auth::sign_out))
        .merge(guarded_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| match o.parse::<HeaderValue>() {
                            Ok(origin) => Some(origin),
                            Err(e) => {
                                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                                None
                            }
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, ServiceError> {
    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}
