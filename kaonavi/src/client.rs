//! Cliente HTTP para a API Kaonavi v2
//!
//! Todas as operações passam por [`KaonaviClient::execute`]:
//! 1. Escrita + dry-run → [`Dispatch::DryRun`], nada é enviado
//! 2. Token via [`TokenManager`] (cache por instância)
//! 3. 401 → invalida o token e repete uma única vez
//! 4. Status não-2xx → variant tipado de [`KaonaviError`]

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::auth::{Credentials, TokenManager};
use crate::config::ClientOptions;
use crate::departments::Departments;
use crate::envelope::{decode_document, decode_envelope, truncate};
use crate::error::{KaonaviError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::layouts::Layouts;
use crate::members::Members;
use crate::roles::Roles;
use crate::sheets::Sheets;
use crate::tasks::{PollPolicy, TaskOutcome, TaskPoller};
use crate::types::{TaskAccepted, TaskId};
use crate::users::Users;
use crate::webhooks::Webhooks;

/// Header de autenticação das requisições
pub const TOKEN_HEADER: &str = "Kaonavi-Token";

/// Classificação de uma operação para o executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Leitura (GET)
    Read,
    /// Escrita síncrona (usuários, configuração de webhook); sem task
    Write,
    /// Escrita que enfileira uma task no serviço
    TaskWrite,
}

impl OperationKind {
    /// Toda escrita é interceptada pelo dry-run; leituras seguem normais
    pub fn is_dry_run_eligible(self) -> bool {
        matches!(self, Self::Write | Self::TaskWrite)
    }
}

/// Resultado do executor: enviado ou interceptado pelo dry-run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    Sent(T),
    DryRun,
}

impl<T> Dispatch<T> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }

    pub fn sent(self) -> Option<T> {
        match self {
            Self::Sent(value) => Some(value),
            Self::DryRun => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Dispatch<U> {
        match self {
            Self::Sent(value) => Dispatch::Sent(f(value)),
            Self::DryRun => Dispatch::DryRun,
        }
    }
}

/// Cliente para a API Kaonavi
///
/// Barato de clonar; clones compartilham o transporte e o cache de token.
#[derive(Clone)]
pub struct KaonaviClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    tokens: TokenManager,
    options: ClientOptions,
}

impl KaonaviClient {
    /// Cria um cliente com o transporte `reqwest` padrão
    pub fn new(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(options.timeout, options.connect_timeout)?;
        Ok(Self::with_transport(credentials, options, Arc::new(transport)))
    }

    /// Atalho: valida key/secret e cria o cliente
    pub fn from_keys(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self> {
        Self::new(Credentials::new(consumer_key, consumer_secret)?, options)
    }

    /// Cria um cliente sobre um transporte arbitrário
    pub fn with_transport(
        credentials: Credentials,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let tokens = TokenManager::new(
            credentials,
            options.resolved_base_url(),
            transport.clone(),
            options.token_refresh_margin,
        );

        tracing::debug!(
            "Kaonavi client created (base_url={}, dry_run={})",
            options.resolved_base_url(),
            options.dry_run
        );

        Self {
            inner: Arc::new(ClientInner {
                transport,
                tokens,
                options,
            }),
        }
    }

    /// URL base efetiva (padrão quando não configurada)
    pub fn base_url(&self) -> &str {
        self.inner.options.resolved_base_url()
    }

    pub fn is_dry_run(&self) -> bool {
        self.inner.options.dry_run
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.inner.tokens
    }

    /// Política de polling configurada para os awaits implícitos
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.inner.options.poll_interval, self.inner.options.task_timeout)
    }

    pub fn layouts(&self) -> Layouts<'_> {
        Layouts::new(self)
    }

    pub fn members(&self) -> Members<'_> {
        Members::new(self)
    }

    pub fn sheets(&self) -> Sheets<'_> {
        Sheets::new(self)
    }

    pub fn departments(&self) -> Departments<'_> {
        Departments::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self)
    }

    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(self)
    }

    pub fn tasks(&self) -> TaskPoller<'_> {
        TaskPoller::new(self)
    }

    /// Executa uma operação
    ///
    /// `path` é relativo à URL base (`/members`, `/tasks/1`, ...).
    pub async fn execute(
        &self,
        kind: OperationKind,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<Dispatch<HttpResponse>> {
        if kind.is_dry_run_eligible() && self.is_dry_run() {
            tracing::info!(
                "🧪 [dry-run] {} {} not sent ({} bytes)",
                method.as_str(),
                self.url(path),
                body.as_deref().map_or(0, str::len)
            );
            if let Some(body) = body.as_deref() {
                tracing::debug!("[dry-run] body: {}", body);
            }
            return Ok(Dispatch::DryRun);
        }

        self.send_authorized(method, path, body.as_deref())
            .await
            .map(Dispatch::Sent)
    }

    /// Envia uma escrita que gera task e devolve o id aceito
    pub async fn submit_task<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<Dispatch<TaskId>> {
        let body = encode_body(body)?;

        match self
            .execute(OperationKind::TaskWrite, method, path, Some(body))
            .await?
        {
            Dispatch::DryRun => Ok(Dispatch::DryRun),
            Dispatch::Sent(response) => {
                let accepted: TaskAccepted = decode_json(&response, "task acceptance")?;
                tracing::info!(
                    "📋 Kaonavi task {} accepted ({} {})",
                    accepted.task_id,
                    method.as_str(),
                    path
                );
                Ok(Dispatch::Sent(accepted.task_id))
            }
        }
    }

    /// Envia a escrita e espera a task com a política padrão
    pub(crate) async fn run_task<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<TaskOutcome> {
        match self.submit_task(method, path, body).await? {
            Dispatch::DryRun => Ok(TaskOutcome::DryRun),
            Dispatch::Sent(task_id) => {
                self.tasks()
                    .await_task(task_id, self.poll_policy(), &CancellationToken::new())
                    .await
            }
        }
    }

    /// GET devolvendo a resposta crua (headers inclusos)
    pub(crate) async fn read_raw(&self, path: &str) -> Result<HttpResponse> {
        self.send_authorized(HttpMethod::Get, path, None).await
    }

    /// GET + decode JSON
    pub(crate) async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.read_raw(path).await?;
        decode_json(&response, path)
    }

    /// GET de uma listagem em envelope `{"<name>": [...]}`
    pub(crate) async fn read_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        name: &str,
    ) -> Result<Vec<T>> {
        let response = self.read_raw(path).await?;
        Ok(decode_envelope(&response.body, Some(name))?.into_items())
    }

    /// Escrita síncrona + decode JSON
    pub(crate) async fn write_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<Dispatch<T>> {
        let body = encode_body(body)?;
        match self
            .execute(OperationKind::Write, method, path, Some(body))
            .await?
        {
            Dispatch::DryRun => Ok(Dispatch::DryRun),
            Dispatch::Sent(response) => decode_json(&response, path).map(Dispatch::Sent),
        }
    }

    /// Escrita síncrona sem corpo de resposta relevante (DELETE)
    pub(crate) async fn write_no_content(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> Result<Dispatch<()>> {
        Ok(self
            .execute(OperationKind::Write, method, path, None)
            .await?
            .map(|_| ()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url().trim_end_matches('/'), path)
    }

    fn request(&self, method: HttpMethod, url: &str, body: Option<&str>, token: &str) -> HttpRequest {
        let request = HttpRequest::new(method, url)
            .header(TOKEN_HEADER, token)
            .header("Accept", "application/json");

        match body {
            Some(body) => request.header("Content-Type", "application/json").body(body),
            None => request,
        }
    }

    /// Envia com token; em 401 invalida e tenta de novo uma vez
    async fn send_authorized(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse> {
        let url = self.url(path);
        tracing::debug!("{} {}", method.as_str(), url);

        let token = self.inner.tokens.get_token().await?;
        let response = self
            .inner
            .transport
            .send(self.request(method, &url, body, &token))
            .await?;

        if response.status != 401 {
            return check_status(response);
        }

        tracing::warn!("🔄 Kaonavi rejected the token for {} {}, retrying once", method.as_str(), url);
        self.inner.tokens.invalidate(&token).await;

        let token = self.inner.tokens.get_token().await?;
        let response = self
            .inner
            .transport
            .send(self.request(method, &url, body, &token))
            .await?;

        check_status(response)
    }
}

impl fmt::Debug for KaonaviClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KaonaviClient")
            .field("base_url", &self.base_url())
            .field("dry_run", &self.is_dry_run())
            .field("tokens", &self.inner.tokens)
            .finish()
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let err = map_status_error(&response);
    tracing::error!("Kaonavi API error ({}): {}", response.status, err);
    Err(err)
}

/// Converte uma resposta não-2xx no variant correspondente
///
/// - 401 → `AuthRejected`
/// - 429 → `RateLimited` (com `Retry-After` em segundos, se houver)
/// - demais → `ServiceError` com `code`/mensagem extraídos do corpo
pub(crate) fn map_status_error(response: &HttpResponse) -> KaonaviError {
    let (code, message) = parse_error_body(&response.body);

    match response.status {
        401 => KaonaviError::AuthRejected(message.unwrap_or_else(|| "token rejected".to_string())),
        429 => KaonaviError::RateLimited {
            retry_after: response.retry_after(),
        },
        status => {
            let message = message.unwrap_or_else(|| {
                if response.body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    truncate(&response.body)
                }
            });
            KaonaviError::ServiceError {
                status,
                code,
                message,
            }
        }
    }
}

// O serviço responde `{"errors": ["...", ...]}`; alguns proxies usam `message`/`error`
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };

    let code = json.get("code").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let message = json
        .get("errors")
        .and_then(|v| v.as_array())
        .map(|errors| {
            errors
                .iter()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|m| !m.is_empty())
        .or_else(|| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

    (code, message)
}

pub(crate) fn decode_json<T: DeserializeOwned>(response: &HttpResponse, context: &str) -> Result<T> {
    decode_document(&response.body, context)
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<String> {
    serde_json::to_string(body).map_err(|e| KaonaviError::Encode(e.to_string()))
}
