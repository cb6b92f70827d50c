//! Token Manager
//!
//! Troca consumer key/secret por um access token (`POST /token`) e mantém o
//! token em cache por instância de cliente.
//!
//! ## Regras
//! - Token válido em cache é devolvido sem I/O
//! - Cache vazio ou expirado: uma única troca em andamento; chamadas
//!   concorrentes esperam o resultado dela em vez de repetir a troca
//! - Um 401 em qualquer requisição invalida o cache (só se ainda for o mesmo
//!   token) e o executor repete a requisição uma única vez

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::map_status_error;
use crate::envelope::truncate;
use crate::error::{KaonaviError, Result};
use crate::http::{HttpMethod, HttpRequest, Transport};

/// Consumer key + consumer secret
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
}

impl Credentials {
    /// Valida e cria as credenciais
    ///
    /// Key ou secret vazios falham aqui, não na primeira requisição.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Result<Self> {
        let consumer_key = consumer_key.into();
        let consumer_secret = consumer_secret.into();

        if consumer_key.trim().is_empty() {
            return Err(KaonaviError::InvalidCredentials(
                "consumer key is empty".to_string(),
            ));
        }
        if consumer_secret.trim().is_empty() {
            return Err(KaonaviError::InvalidCredentials(
                "consumer secret is empty".to_string(),
            ));
        }

        Ok(Self {
            consumer_key,
            consumer_secret,
        })
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Header `Authorization: Basic base64(key:secret)`
    fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.consumer_key, self.consumer_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .finish()
    }
}

/// Validade máxima considerada para um token, qualquer que seja o `expires_in`
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Token de acesso em cache
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    /// `expires_in` é a validade declarada pelo serviço; a renovação acontece
    /// `refresh_margin` antes (no máximo metade da validade)
    pub fn new(value: String, expires_in: Duration, refresh_margin: Duration) -> Self {
        let margin = refresh_margin.min(expires_in / 2);
        let lifetime = expires_in.saturating_sub(margin).min(MAX_TOKEN_LIFETIME);
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(lifetime).unwrap_or(now + MAX_TOKEN_LIFETIME),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Resposta de `POST /token`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: u64,
}

/// Gerenciador do token de uma instância de cliente
pub struct TokenManager {
    credentials: Credentials,
    token_url: String,
    transport: Arc<dyn Transport>,
    refresh_margin: Duration,
    cache: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        credentials: Credentials,
        base_url: &str,
        transport: Arc<dyn Transport>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            credentials,
            token_url: format!("{}/token", base_url.trim_end_matches('/')),
            transport,
            refresh_margin,
            cache: Mutex::new(None),
        }
    }

    /// Obter token válido (cache → troca de credenciais)
    ///
    /// O lock fica retido durante a troca: quem chegar depois espera e
    /// reaproveita o token obtido.
    pub async fn get_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if !token.is_expired() {
                tracing::trace!("Kaonavi token served from cache");
                return Ok(token.value.clone());
            }
            tracing::debug!("Kaonavi token expired, acquiring a new one");
        }

        let token = self.acquire().await?;
        let value = token.value.clone();
        *cache = Some(token);

        Ok(value)
    }

    /// Descarta o token rejeitado pelo serviço
    ///
    /// Se outra chamada já trocou o token, o cache é mantido.
    pub async fn invalidate(&self, rejected: &str) {
        let mut cache = self.cache.lock().await;
        if cache.as_ref().is_some_and(|token| token.value == rejected) {
            tracing::warn!("🗑️ Kaonavi token rejected, cache invalidated");
            *cache = None;
        }
    }

    /// Limpa o cache incondicionalmente (força nova troca)
    pub async fn clear(&self) {
        *self.cache.lock().await = None;
    }

    async fn acquire(&self) -> Result<AccessToken> {
        tracing::debug!("POST {}", self.token_url);

        let request = HttpRequest::new(HttpMethod::Post, &self.token_url)
            .header("Authorization", self.credentials.basic_authorization())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body("grant_type=client_credentials");

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let err = map_status_error(&response);
            tracing::error!("Kaonavi token exchange failed ({}): {}", response.status, err);
            return Err(err);
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            KaonaviError::malformed(format!("token response: {}", e), truncate(&response.body))
        })?;

        if let Some(token_type) = parsed.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                tracing::warn!("Unexpected Kaonavi token type: {}", token_type);
            }
        }

        tracing::info!(
            "✅ Kaonavi access token acquired (expires in {}s)",
            parsed.expires_in
        );

        Ok(AccessToken::new(
            parsed.access_token,
            Duration::from_secs(parsed.expires_in),
            self.refresh_margin,
        ))
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("token_url", &self.token_url)
            .finish()
    }
}
