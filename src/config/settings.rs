use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use kaonavi::{ClientOptions, WebhookVerifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub kaonavi: KaonaviSettings,
    #[serde(default)]
    pub webhook: WebhookReceiverSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Chave exigida em `X-Admin-Key` nas rotas /admin
    pub admin_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KaonaviSettings {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub base_url: Option<String>,
    pub dry_run: bool,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub task_timeout_secs: u64,
    pub token_refresh_margin_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WebhookReceiverSettings {
    pub token: Option<String>,
    pub signing_secret: Option<String>,
}

impl KaonaviSettings {
    /// Converte para as opções do cliente
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.base_url.clone().filter(|url| !url.is_empty()),
            dry_run: self.dry_run,
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            token_refresh_margin: Duration::from_secs(self.token_refresh_margin_secs),
        }
    }
}

impl WebhookReceiverSettings {
    /// Verificador das notificações; `None` quando o token não foi configurado
    pub fn verifier(&self) -> kaonavi::Result<Option<WebhookVerifier>> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let mut verifier = WebhookVerifier::new(token)?;
        if let Some(secret) = self.signing_secret.as_deref() {
            verifier = verifier.with_signing_secret(secret);
        }
        Ok(Some(verifier))
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis de ambiente específicas
        if let Ok(key) = std::env::var("KAONAVI_CONSUMER_KEY") {
            builder = builder.set_override("kaonavi.consumer_key", key)?;
        }
        if let Ok(secret) = std::env::var("KAONAVI_CONSUMER_SECRET") {
            builder = builder.set_override("kaonavi.consumer_secret", secret)?;
        }
        if let Ok(token) = std::env::var("KAONAVI_WEBHOOK_TOKEN") {
            builder = builder.set_override("webhook.token", token)?;
        }
        if let Ok(dry_run) = std::env::var("KAONAVI_DRY_RUN") {
            builder = builder.set_override("kaonavi.dry_run", dry_run)?;
        }
        if let Ok(admin_key) = std::env::var("ADMIN_API_KEY") {
            builder = builder.set_override("server.admin_key", admin_key)?;
        }

        builder = builder.add_source(
            Environment::with_prefix("KAONAVI_MIDDLEWARE")
                .prefix_separator("__")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    /// Valores usados quando nenhum arquivo define a chave
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("kaonavi.consumer_key", "")?
            .set_default("kaonavi.consumer_secret", "")?
            .set_default("kaonavi.dry_run", false)?
            .set_default("kaonavi.timeout_secs", 30)?
            .set_default("kaonavi.connect_timeout_secs", 5)?
            .set_default("kaonavi.poll_interval_ms", 2000)?
            .set_default("kaonavi.task_timeout_secs", 300)?
            .set_default("kaonavi.token_refresh_margin_secs", 60)
    }
}
