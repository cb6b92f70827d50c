//! Transporte de teste: responde via closure e registra cada requisição

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::Credentials;
use crate::client::KaonaviClient;
use crate::config::ClientOptions;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport};

pub(crate) const TOKEN_BODY: &str =
    r#"{"access_token":"tok","token_type":"Bearer","expires_in":86400}"#;

type Handler = Box<dyn Fn(usize, &HttpRequest) -> Result<HttpResponse> + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Resposta em função do índice da chamada (0, 1, 2, ...)
    pub(crate) fn new(
        handler: impl Fn(usize) -> Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self::routed(move |call, _| handler(call))
    }

    /// Resposta em função do índice da chamada e da requisição
    pub(crate) fn routed(
        handler: impl Fn(usize, &HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Quantas requisições foram para uma URL terminando em `suffix`
    pub(crate) fn calls_to(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.handler)(call, &request)
    }
}

/// Cliente sobre um mock que já responde `/token`; o resto vai para `handler`
pub(crate) fn mock_client(
    options: ClientOptions,
    handler: impl Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
) -> (KaonaviClient, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::routed(move |_, request| {
        if request.url.ends_with("/token") {
            Ok(HttpResponse::new(200, TOKEN_BODY))
        } else {
            handler(request)
        }
    }));
    let client = KaonaviClient::with_transport(
        Credentials::new("key", "secret").unwrap(),
        options.with_base_url("https://kaonavi.test/api/v2.0"),
        transport.clone(),
    );
    (client, transport)
}
