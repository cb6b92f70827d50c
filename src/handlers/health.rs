use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "kaonavi-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Pronto quando a troca de token com a Kaonavi funciona
pub async fn ready_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (kaonavi_status, error) = match state.client.token_manager().get_token().await {
        Ok(_) => ("connected", None),
        Err(e) => {
            log_kaonavi_api_error("/token", &e.to_string());
            ("disconnected", Some(e.to_string()))
        }
    };

    let response = json!({
        "ready": error.is_none(),
        "service": "kaonavi-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "kaonavi": {
                "status": kaonavi_status,
                "base_url": state.client.base_url(),
                "dry_run": state.client.is_dry_run(),
                "error": error
            },
            "webhook_receiver": {
                "configured": state.webhook_verifier.is_some()
            }
        }
    });

    if kaonavi_status == "connected" {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
