use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use kaonavi::codec::TaggedEnum;
use kaonavi::WebhookHeaders;
use serde_json::{json, Value};

use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

/// Recebe notificações de alteração de membros da Kaonavi
///
/// Valida Content-Type, `Kaonavi-Token` e, quando configurado, a assinatura
/// HMAC do corpo. Responde com o resumo do evento aceito.
pub async fn handle_kaonavi_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let request_id = uuid::Uuid::new_v4().to_string();
    log_request_received("/webhooks/kaonavi", "POST");

    let Some(verifier) = state.webhook_verifier.as_ref() else {
        log_webhook_rejected(&request_id, "webhook token not configured");
        return Err(AppError::ConfigError(
            "Kaonavi webhook token is not configured".to_string(),
        ));
    };

    let webhook_headers = WebhookHeaders::from_lookup(|name| {
        headers.get(name).and_then(|value| value.to_str().ok())
    });

    let payload = verifier
        .verify(&webhook_headers, &body)
        .map_err(|e| {
            log_webhook_rejected(&request_id, &e.to_string());
            AppError::from(e)
        })?;

    let codes: Vec<&str> = payload.member_codes().collect();
    log_webhook_accepted(&request_id, payload.event.tag(), codes.len());

    Ok(Json(json!({
        "request_id": request_id,
        "event": payload.event,
        "event_time": payload.event_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        "member_codes": codes,
        "received_at": chrono::Utc::now().to_rfc3339()
    })))
}
