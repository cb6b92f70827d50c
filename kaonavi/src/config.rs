//! Opções do cliente Kaonavi

use std::time::Duration;

/// URL base da API v2
pub const DEFAULT_BASE_URL: &str = "https://api.kaonavi.jp/api/v2.0";

/// Configuração de um [`crate::KaonaviClient`]
///
/// # Timeouts padrão
///
/// - Total: 30s
/// - Connect: 5s
/// - Intervalo de polling de task: 2s
/// - Timeout de await de task: 5min
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// URL base; `None` usa [`DEFAULT_BASE_URL`], um valor dado é mantido como está
    pub base_url: Option<String>,

    /// Não transmite operações de escrita que geram task
    pub dry_run: bool,

    pub timeout: Duration,
    pub connect_timeout: Duration,

    /// Intervalo entre consultas de status de task
    pub poll_interval: Duration,

    /// Prazo total de um await de task, contado a partir da chamada
    pub task_timeout: Duration,

    /// Antecedência com que o token é renovado antes de expirar
    pub token_refresh_margin: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            dry_run: false,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(2),
            task_timeout: Duration::from_secs(300),
            token_refresh_margin: Duration::from_secs(60),
        }
    }
}

impl ClientOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_polling(mut self, poll_interval: Duration, task_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.task_timeout = task_timeout;
        self
    }

    /// URL base efetiva
    pub fn resolved_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url_is_set_when_missing() {
        let options = ClientOptions::default();
        assert_eq!(options.resolved_base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_existing_base_url_is_left_untouched() {
        let options = ClientOptions::default().with_base_url("http://localhost:8080/kaonavi/");
        assert_eq!(options.resolved_base_url(), "http://localhost:8080/kaonavi/");
    }
}
