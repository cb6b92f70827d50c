// Biblioteca do middleware Kaonavi
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod utils;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use kaonavi::{KaonaviClient, WebhookVerifier};
use tower_http::trace::TraceLayer;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub client: KaonaviClient,
    pub webhook_verifier: Option<WebhookVerifier>,
    pub environment: String,
}

impl AppState {
    pub fn new(settings: config::Settings, client: KaonaviClient) -> kaonavi::Result<Self> {
        let webhook_verifier = settings.webhook.verifier()?;
        if webhook_verifier.is_none() {
            tracing::warn!("⚠️  Webhook token not configured - /webhooks/kaonavi will reject calls");
        }

        Ok(Self {
            settings,
            client,
            webhook_verifier,
            environment: std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Monta todas as rotas do servidor
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/members", get(handlers::list_members))
        .route("/layouts/member", get(handlers::member_layout))
        .route("/departments", get(handlers::list_departments))
        .route("/tasks/:task_id", get(handlers::task_progress))
        .route(
            "/webhooks",
            get(handlers::list_webhooks).put(handlers::ensure_webhook),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_admin_key,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::ready_check))
        .route("/webhooks/kaonavi", post(handlers::handle_kaonavi_webhook))
        .nest("/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
