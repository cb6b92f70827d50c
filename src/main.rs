/// Servidor HTTP do middleware Kaonavi
///
/// - `POST /webhooks/kaonavi`: recebe e valida notificações de membros
/// - `/admin/*`: consultas à API Kaonavi (membros, layouts, tasks, webhooks)
/// - `/health`, `/ready`: liveness e prontidão
use std::sync::Arc;

use anyhow::Context;
use kaonavi::KaonaviClient;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use kaonavi_middleware::config::Settings;
use kaonavi_middleware::utils::logging::*;
use kaonavi_middleware::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kaonavi=debug")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    let client = KaonaviClient::from_keys(
        &settings.kaonavi.consumer_key,
        &settings.kaonavi.consumer_secret,
        settings.kaonavi.client_options(),
    )
    .context("Failed to create Kaonavi client")?;

    let host = settings.server.host.clone();
    let port = settings.server.port;
    log_server_startup(port, client.is_dry_run());

    let state = Arc::new(AppState::new(settings, client).context("Invalid webhook settings")?);
    let app = build_router(state);

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    log_server_ready(&host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_warning(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_warning(&format!("Failed to install SIGTERM handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
