//! Cadastro básico de membros
//!
//! Toda escrita vira uma task no serviço; os métodos esperam a task terminar
//! com a política padrão do cliente. Para controlar prazo ou cancelamento use
//! [`KaonaviClient::submit_task`] + [`crate::tasks::TaskPoller::await_task`].

use serde::Serialize;

use crate::client::KaonaviClient;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::tasks::TaskOutcome;
use crate::types::{MemberData, MemberList};

#[derive(Serialize)]
struct MemberDataBody<'a> {
    member_data: &'a [MemberData],
}

#[derive(Serialize)]
struct CodesBody<'a> {
    codes: &'a [String],
}

/// Operações sobre `/members`
pub struct Members<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Members<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Todos os membros
    pub async fn list(&self) -> Result<MemberList> {
        self.client.read_json("/members").await
    }

    /// Adiciona membros (códigos novos)
    pub async fn create(&self, members: &[MemberData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Post, "/members", members).await
    }

    /// Substitui o cadastro inteiro; membros ausentes são removidos
    pub async fn replace(&self, members: &[MemberData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Put, "/members", members).await
    }

    /// Atualiza só os campos enviados dos membros informados
    pub async fn update(&self, members: &[MemberData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Patch, "/members", members).await
    }

    /// Atualiza ou cria por código (upsert)
    pub async fn overwrite(&self, members: &[MemberData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Post, "/members/overwrite", members).await
    }

    /// Remove membros pelo código
    pub async fn delete(&self, codes: &[String]) -> Result<TaskOutcome> {
        tracing::info!("🗑️ Deleting {} Kaonavi members", codes.len());
        self.client
            .run_task(HttpMethod::Post, "/members/delete", &CodesBody { codes })
            .await
    }

    async fn write(&self, method: HttpMethod, path: &str, members: &[MemberData]) -> Result<TaskOutcome> {
        tracing::info!("📤 {} {} with {} members", method.as_str(), path, members.len());
        self.client
            .run_task(method, path, &MemberDataBody { member_data: members })
            .await
    }
}
