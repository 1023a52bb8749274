use identity_service::{
    build_router,
    config::IdentityConfig,
    services::{AdminService, IdentityService, SmtpOtpChannel},
    store::{AccountStore, MemoryStore},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), identity_service::error::ServiceError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = IdentityConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    // The account store is an external collaborator behind a trait; the
    // in-process backend is the reference wiring.
    let store: Arc<dyn AccountStore> = Arc::new(MemoryStore::new());

    let channel = Arc::new(SmtpOtpChannel::new(&config.smtp)?);
    tracing::info!("OTP channel initialized");

    let identity = IdentityService::new(
        store.clone(),
        channel,
        config.otp.clone(),
        config.session.clone(),
    );
    let admin = AdminService::new(store.clone());

    let state = AppState {
        config: config.clone(),
        store,
        identity,
        admin,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
