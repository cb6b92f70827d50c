use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kaonavi::{KaonaviError, WebhookRejection};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Kaonavi(KaonaviError),
    ConfigError(String),
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Kaonavi(err) => write!(f, "Kaonavi error: {}", err),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<KaonaviError> for AppError {
    fn from(err: KaonaviError) -> Self {
        AppError::Kaonavi(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Kaonavi(err) => kaonavi_status(err),
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Status devolvido ao chamador para cada falha do cliente Kaonavi
fn kaonavi_status(err: &KaonaviError) -> StatusCode {
    match err {
        KaonaviError::Webhook(WebhookRejection::UnsupportedContentType(_)) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        KaonaviError::Webhook(WebhookRejection::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
        KaonaviError::Webhook(_) => StatusCode::UNAUTHORIZED,
        KaonaviError::InvalidCredentials(_)
        | KaonaviError::Config(_)
        | KaonaviError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        KaonaviError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        KaonaviError::ServiceError { status: 404, .. } => StatusCode::NOT_FOUND,
        KaonaviError::TaskTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        KaonaviError::AuthRejected(_)
        | KaonaviError::Transport(_)
        | KaonaviError::ServiceError { .. }
        | KaonaviError::MalformedResponse { .. }
        | KaonaviError::TaskFailed { .. }
        | KaonaviError::Cancelled { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Kaonavi(err) => err.to_string(),
            AppError::ConfigError(msg) | AppError::ValidationError(msg) => msg,
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_webhook_rejections_map_to_client_errors() {
        let unsupported = AppError::from(KaonaviError::Webhook(
            WebhookRejection::UnsupportedContentType("text/plain".into()),
        ));
        assert_eq!(unsupported.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let mismatch = AppError::from(KaonaviError::Webhook(WebhookRejection::TokenMismatch));
        assert_eq!(mismatch.status_code(), StatusCode::UNAUTHORIZED);

        let payload = AppError::from(KaonaviError::Webhook(WebhookRejection::InvalidPayload(
            "eof".into(),
        )));
        assert_eq!(payload.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failures_map_to_gateway_errors() {
        let service = AppError::from(KaonaviError::ServiceError {
            status: 500,
            code: None,
            message: "boom".into(),
        });
        assert_eq!(service.status_code(), StatusCode::BAD_GATEWAY);

        let missing = AppError::from(KaonaviError::ServiceError {
            status: 404,
            code: None,
            message: "not found".into(),
        });
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let limited = AppError::from(KaonaviError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        });
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let timed_out = AppError::from(KaonaviError::TaskTimedOut {
            task_id: kaonavi::TaskId(7),
        });
        assert_eq!(timed_out.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::ValidationError("bad id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "bad id");
        assert_eq!(body["status"], 400);
    }
}
