//! Tipos de erro para o crate kaonavi

use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;
use crate::types::TaskId;
use crate::webhooks::WebhookRejection;

/// Erros do cliente Kaonavi
///
/// Toda operação pública retorna um destes variants; nenhuma falha é
/// convertida em mensagem genérica.
#[derive(Debug, Error)]
pub enum KaonaviError {
    /// Consumer key ou consumer secret ausente/vazio (falha de construção)
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// O serviço rejeitou o token (HTTP 401)
    #[error("Authentication rejected by Kaonavi: {0}")]
    AuthRejected(String),

    /// Rate limit atingido (HTTP 429)
    #[error("Rate limited by Kaonavi (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Falha de conexão, timeout ou erro de I/O na camada HTTP
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Erro reportado pelo serviço (4xx/5xx)
    #[error("Kaonavi API error (status {status}): {message}")]
    ServiceError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Corpo de resposta que não passa pelos codecs/envelope
    #[error("Malformed response ({context}): {raw}")]
    MalformedResponse { context: String, raw: String },

    /// Task terminou com NG/ERROR
    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: TaskId, reason: String },

    /// Task não chegou a um estado terminal dentro do timeout
    #[error("Task {task_id} did not finish before the timeout")]
    TaskTimedOut { task_id: TaskId },

    /// Await da task cancelado pelo chamador
    #[error("Waiting for task {task_id} was cancelled")]
    Cancelled { task_id: TaskId },

    /// Corpo de requisição que não pôde ser serializado
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// Erro de configuração do cliente
    #[error("Configuration error: {0}")]
    Config(String),

    /// Webhook recebido rejeitado pelo verificador
    #[error("Webhook rejected: {0}")]
    Webhook(#[from] WebhookRejection),
}

impl KaonaviError {
    /// Constrói um `MalformedResponse` a partir de uma falha de codec
    pub fn malformed(context: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            raw: raw.into(),
        }
    }
}

impl From<CodecError> for KaonaviError {
    fn from(err: CodecError) -> Self {
        let raw = err.raw().to_string();
        Self::MalformedResponse {
            context: err.to_string(),
            raw,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, KaonaviError>;
