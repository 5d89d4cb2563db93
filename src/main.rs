mod domain;
mod clients;

mod app_system;

#[cfg(test)]
mod mock_framework;

mod actor_framework;
mod user_actor;
mod product_actor;
mod order_actor;

mod api;
mod auth;
mod config;
mod notifications;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, Instrument};

use crate::api::{create_app, AppState, UploadStore};
use crate::app_system::{seed_demo_data, setup_tracing, MarketSystem};
use crate::auth::{AuthService, LogMailer, TokenIssuer};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::load().map_err(|e| e.to_string())?;
    info!(address = %config.address(), "Starting millet marketplace");

    let system = MarketSystem::start(config.actor_buffer, config.data_dir.as_deref())
        .await
        .map_err(|e| e.to_string())?;

    if config.seed_demo_data {
        let span = tracing::info_span!("seed");
        let seeded = seed_demo_data(&system, config.bcrypt_cost)
            .instrument(span)
            .await
            .map_err(|e| e.to_string())?;
        info!(seeded, "Demo data check complete");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| format!("Cannot create upload directory {}: {e}", config.upload_dir.display()))?;

    let auth = AuthService::new(
        system.user_client.clone(),
        TokenIssuer::new(&config.jwt_secret, chrono::Duration::days(config.jwt_expire_days)),
        Arc::new(LogMailer),
        config.bcrypt_cost,
        config.frontend_url.clone(),
    );
    let state = AppState {
        users: system.user_client.clone(),
        products: system.product_client.clone(),
        orders: system.order_client.clone(),
        auth,
        notifier: system.notifier.clone(),
        dispatcher: Arc::new(system.notifier.clone()),
        uploads: Arc::new(UploadStore::new(&config.upload_dir, config.max_file_size)),
    };
    let app = create_app(state);

    let listener = TcpListener::bind(config.address())
        .await
        .map_err(|e| format!("Cannot bind {}: {e}", config.address()))?;
    info!("Listening on {}", config.address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| e.to_string())?;

    // The router and its client clones are gone once serve returns.
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
