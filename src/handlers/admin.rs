//! Consultas administrativas sobre a API Kaonavi
//!
//! Todas as rotas ficam atrás de [`crate::middleware::require_admin_key`].

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use kaonavi::{Dispatch, TaskId, WebhookConfig, WebhookEvent, WebhookSettings};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

pub async fn list_members(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/admin/members", "GET");

    let members = state.client.members().list().await.map_err(|e| {
        log_kaonavi_api_error("/members", &e.to_string());
        AppError::from(e)
    })?;

    Ok(Json(json!({
        "count": members.member_data.len(),
        "updated_at": members.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        "member_data": members.member_data
    })))
}

pub async fn member_layout(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/admin/layouts/member", "GET");

    let layout = state.client.layouts().member_layout().await?;
    Ok(Json(serde_json::to_value(layout)?))
}

pub async fn list_departments(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/admin/departments", "GET");

    let departments = state.client.departments().list().await?;
    Ok(Json(json!({
        "count": departments.len(),
        "department_data": departments
    })))
}

pub async fn task_progress(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u64>,
) -> AppResult<Json<Value>> {
    log_request_received("/admin/tasks/:task_id", "GET");

    let progress = state.client.tasks().progress(TaskId(task_id)).await?;
    Ok(Json(serde_json::to_value(progress)?))
}

pub async fn list_webhooks(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<WebhookConfig>>> {
    log_request_received("/admin/webhooks", "GET");

    Ok(Json(state.client.webhooks().list().await?))
}

#[derive(Debug, Deserialize)]
pub struct EnsureWebhookRequest {
    pub url: String,
    #[serde(default)]
    pub events: Option<Vec<WebhookEvent>>,
}

/// Registra (ou atualiza) o webhook apontando para este servidor
///
/// O `secret_token` enviado é o `webhook.token` configurado, o mesmo usado
/// para validar as notificações recebidas. Em dry-run nada é gravado.
pub async fn ensure_webhook(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnsureWebhookRequest>,
) -> AppResult<Json<Value>> {
    log_request_received("/admin/webhooks", "PUT");

    if request.url.trim().is_empty() {
        return Err(AppError::ValidationError("url must not be empty".to_string()));
    }

    let secret_token = state
        .settings
        .webhook
        .token
        .clone()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::ConfigError("Kaonavi webhook token is not configured".to_string()))?;

    let settings = WebhookSettings {
        url: request.url,
        events: request.events.unwrap_or_else(WebhookEvent::all),
        secret_token,
    };

    match state.client.webhooks().ensure(&settings).await? {
        Dispatch::Sent(webhook) => Ok(Json(serde_json::to_value(webhook)?)),
        Dispatch::DryRun => Ok(Json(json!({
            "dry_run": true,
            "url": settings.url,
            "events": settings.events
        }))),
    }
}
