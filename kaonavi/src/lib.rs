//! Cliente da API Kaonavi v2
//!
//! ## Funcionalidades
//!
//! - **Token**: troca consumer key/secret por token, com cache por cliente e
//!   uma única troca em andamento
//! - **Executor**: mapeamento tipado de erros, retry único em 401, dry-run
//!   para escritas que geram task
//! - **Tasks**: polling com intervalo, prazo e cancelamento
//! - **Codecs**: datas `yyyy-MM-dd` / `yyyy-MM-dd HH:mm:ss`, enums por tag
//!   ou ordinal, envelopes com nome de propriedade dinâmico
//! - **Webhooks**: verificação das notificações e CRUD da configuração
//!
//! ## Exemplo
//!
//! ```rust,ignore
//! use kaonavi::{ClientOptions, KaonaviClient};
//!
//! let client = KaonaviClient::from_keys("consumer_key", "consumer_secret", ClientOptions::default())?;
//!
//! let members = client.members().list().await?;
//! println!("{} membros (atualizado em {})", members.member_data.len(), members.updated_at);
//!
//! let outcome = client.members().update(&members.member_data).await?;
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod departments;
pub mod envelope;
pub mod error;
pub mod http;
pub mod layouts;
pub mod members;
pub mod roles;
pub mod sheets;
pub mod tasks;
pub mod types;
pub mod users;
pub mod webhooks;

#[cfg(test)]
mod mock;

pub use auth::{Credentials, TokenManager};
pub use client::{Dispatch, KaonaviClient, OperationKind};
pub use codec::CodecError;
pub use config::{ClientOptions, DEFAULT_BASE_URL};
pub use envelope::ApiEnvelope;
pub use error::{KaonaviError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use tasks::{PollPolicy, TaskOutcome};
pub use types::*;
pub use webhooks::{
    WebhookConfig, WebhookEvent, WebhookHeaders, WebhookPayload, WebhookRejection,
    WebhookSettings, WebhookVerifier,
};

// Re-exports para quem precisa cancelar awaits de task
pub use tokio_util::sync::CancellationToken;
