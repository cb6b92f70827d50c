/// Middleware de autenticação para endpoints administrativos
///
/// Valida que a requisição contém a chave configurada em `server.admin_key`
/// no header X-Admin-Key.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Middleware que requer a chave de admin nos endpoints /admin/*
///
/// # Configuração
///
/// `server.admin_key` no arquivo de config, ou a variável `ADMIN_API_KEY`:
/// ```bash
/// export ADMIN_API_KEY="your-secure-random-key-here"
/// ```
///
/// # Respostas
///
/// - **401 Unauthorized**: Key ausente ou inválido
/// - **503 Service Unavailable**: Key não configurado em produção
///
/// Em desenvolvimento, sem key configurado, o acesso é liberado com warning.
pub async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided_key = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let expected_key = state
        .settings
        .server
        .admin_key
        .as_deref()
        .filter(|key| !key.is_empty());

    match (expected_key, provided_key, state.is_production()) {
        (Some(expected), Some(provided), _) if expected == provided => {
            tracing::debug!("✅ Admin access granted");
            Ok(next.run(request).await)
        }

        (Some(_), provided, _) => {
            tracing::warn!(
                "❌ Admin access denied - Invalid or missing X-Admin-Key: {:?}",
                provided.map(|_| "<redacted>")
            );
            Err(unauthorized_response())
        }

        (None, _, false) => {
            tracing::warn!(
                "⚠️  Admin key not configured - Allowing access in development mode. \
                 Configure ADMIN_API_KEY in production!"
            );
            Ok(next.run(request).await)
        }

        (None, _, true) => {
            tracing::error!("🚨 Admin key not configured in production! Blocking admin access.");
            Err(service_unavailable_response())
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid X-Admin-Key header"
        })),
    )
        .into_response()
}

fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "message": "Admin key not configured on server"
        })),
    )
        .into_response()
}
