//! Webhooks da Kaonavi
//!
//! Duas partes:
//! - [`WebhookVerifier`]: valida e decodifica as notificações recebidas
//!   (`member_created`, `member_updated`, `member_deleted`)
//! - [`Webhooks`]: CRUD da configuração de webhooks (`/webhook`)
//!
//! ## Verificação
//! 1. `Content-Type` precisa ser `application/json`
//! 2. Header `Kaonavi-Token` igual ao token configurado (comparação em tempo constante)
//! 3. Com segredo de assinatura configurado: `X-Kaonavi-Signature` com o
//!    HMAC-SHA256 (hex) do corpo bruto

use chrono::NaiveDateTime;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::client::{Dispatch, KaonaviClient, TOKEN_HEADER};
use crate::codec::{self, tagged_enum_serde, TaggedEnum};
use crate::error::{KaonaviError, Result};
use crate::http::HttpMethod;

type HmacSha256 = Hmac<Sha256>;

/// Header com a assinatura HMAC do corpo
pub const SIGNATURE_HEADER: &str = "X-Kaonavi-Signature";

/// Motivo da rejeição de um webhook recebido
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookRejection {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("missing Kaonavi-Token header")]
    MissingToken,

    #[error("Kaonavi-Token does not match")]
    TokenMismatch,

    #[error("missing X-Kaonavi-Signature header")]
    MissingSignature,

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Evento notificado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    MemberCreated,
    MemberUpdated,
    MemberDeleted,
}

impl TaggedEnum for WebhookEvent {
    const FIELD: &'static str = "event";

    fn tag(self) -> &'static str {
        match self {
            Self::MemberCreated => "member_created",
            Self::MemberUpdated => "member_updated",
            Self::MemberDeleted => "member_deleted",
        }
    }

    fn from_tag(raw: &str) -> Option<Self> {
        match raw {
            "member_created" => Some(Self::MemberCreated),
            "member_updated" => Some(Self::MemberUpdated),
            "member_deleted" => Some(Self::MemberDeleted),
            _ => None,
        }
    }
}

tagged_enum_serde!(WebhookEvent);

impl WebhookEvent {
    pub fn all() -> Vec<Self> {
        vec![Self::MemberCreated, Self::MemberUpdated, Self::MemberDeleted]
    }
}

/// Membro afetado por um evento
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCode {
    pub code: String,
}

/// Corpo de uma notificação
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    #[serde(with = "codec::date_time")]
    pub event_time: NaiveDateTime,
    pub member_data: Vec<MemberCode>,
}

impl WebhookPayload {
    pub fn member_codes(&self) -> impl Iterator<Item = &str> {
        self.member_data.iter().map(|member| member.code.as_str())
    }
}

/// Headers relevantes de uma notificação recebida
#[derive(Debug, Default, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub content_type: Option<&'a str>,
    pub token: Option<&'a str>,
    pub signature: Option<&'a str>,
}

impl<'a> WebhookHeaders<'a> {
    /// Monta a partir de qualquer mapa de headers (`lookup(nome)`)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        Self {
            content_type: lookup("Content-Type"),
            token: lookup(TOKEN_HEADER),
            signature: lookup(SIGNATURE_HEADER),
        }
    }
}

/// Verificador de notificações recebidas
#[derive(Clone)]
pub struct WebhookVerifier {
    token: String,
    signing_secret: Option<String>,
}

impl WebhookVerifier {
    /// `token` é o `secret_token` cadastrado na configuração do webhook
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(KaonaviError::Config("webhook token is empty".to_string()));
        }
        Ok(Self {
            token,
            signing_secret: None,
        })
    }

    /// Exige também a assinatura HMAC-SHA256 do corpo
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn requires_signature(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Valida headers + corpo e decodifica o payload
    pub fn verify(&self, headers: &WebhookHeaders<'_>, body: &[u8]) -> Result<WebhookPayload> {
        let content_type = headers.content_type.unwrap_or_default();
        if !is_json(content_type) {
            return Err(WebhookRejection::UnsupportedContentType(content_type.to_string()).into());
        }

        let token = headers.token.ok_or(WebhookRejection::MissingToken)?;
        if !constant_time_eq(token.as_bytes(), self.token.as_bytes()) {
            tracing::warn!("Kaonavi webhook rejected: token mismatch");
            return Err(WebhookRejection::TokenMismatch.into());
        }

        if let Some(secret) = self.signing_secret.as_deref() {
            let signature = headers.signature.ok_or(WebhookRejection::MissingSignature)?;
            if !verify_signature(signature, secret, body) {
                tracing::warn!("Kaonavi webhook rejected: invalid signature");
                return Err(WebhookRejection::InvalidSignature.into());
            }
        }

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| WebhookRejection::InvalidPayload(e.to_string()))?;

        tracing::info!(
            "📥 Kaonavi webhook {} for {} members",
            payload.event.tag(),
            payload.member_data.len()
        );

        Ok(payload)
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("token", &"***")
            .field("requires_signature", &self.requires_signature())
            .finish()
    }
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|mime| mime.eq_ignore_ascii_case("application/json"))
}

/// HMAC-SHA256 (hex) do corpo, verificado em tempo constante
pub fn verify_signature(signature: &str, secret: &str, body: &[u8]) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Assina um corpo (útil para testes e reenvio)
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| KaonaviError::Config(format!("invalid signing secret: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Configuração (/webhook)
// ============================================================================

/// Webhook cadastrado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: u64,
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub secret_token: String,
}

/// Corpo de criação/atualização
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub secret_token: String,
}

/// Operações sobre `/webhook`
pub struct Webhooks<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Webhooks cadastrados (envelope `webhook_data`)
    pub async fn list(&self) -> Result<Vec<WebhookConfig>> {
        self.client.read_envelope("/webhook", "webhook_data").await
    }

    pub async fn create(&self, settings: &WebhookSettings) -> Result<Dispatch<WebhookConfig>> {
        tracing::info!("Creating Kaonavi webhook for {}", settings.url);
        self.client
            .write_json(HttpMethod::Post, "/webhook", settings)
            .await
    }

    pub async fn update(
        &self,
        webhook_id: u64,
        settings: &WebhookSettings,
    ) -> Result<Dispatch<WebhookConfig>> {
        self.client
            .write_json(HttpMethod::Patch, &format!("/webhook/{}", webhook_id), settings)
            .await
    }

    pub async fn delete(&self, webhook_id: u64) -> Result<Dispatch<()>> {
        tracing::info!("🗑️ Deleting Kaonavi webhook {}", webhook_id);
        self.client
            .write_no_content(HttpMethod::Delete, &format!("/webhook/{}", webhook_id))
            .await
    }

    /// Cria ou atualiza o webhook da URL dada
    ///
    /// A listagem é feita mesmo em dry-run; só a escrita é suprimida.
    pub async fn ensure(&self, settings: &WebhookSettings) -> Result<Dispatch<WebhookConfig>> {
        let existing = self
            .list()
            .await?
            .into_iter()
            .find(|webhook| webhook.url == settings.url);

        match existing {
            Some(webhook) => {
                tracing::info!("Webhook already registered for {}, updating", settings.url);
                self.update(webhook.id, settings).await
            }
            None => self.create(settings).await,
        }
    }
}
