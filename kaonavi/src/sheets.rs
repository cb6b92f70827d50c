//! Dados de sheets (informações adicionais por membro)

use serde::Serialize;

use crate::client::KaonaviClient;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::tasks::TaskOutcome;
use crate::types::{SheetData, SheetDataList};

#[derive(Serialize)]
struct SheetDataBody<'a> {
    member_data: &'a [SheetData],
}

/// Operações sobre `/sheets/{id}`
pub struct Sheets<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Sheets<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Registros de todos os membros na sheet
    pub async fn list(&self, sheet_id: u64) -> Result<SheetDataList> {
        self.client.read_json(&format!("/sheets/{}", sheet_id)).await
    }

    /// Substitui todos os registros da sheet
    pub async fn replace(&self, sheet_id: u64, data: &[SheetData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Put, format!("/sheets/{}", sheet_id), data).await
    }

    /// Substitui os registros dos membros informados
    pub async fn update(&self, sheet_id: u64, data: &[SheetData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Patch, format!("/sheets/{}", sheet_id), data).await
    }

    /// Acrescenta registros (só sheets de registro múltiplo)
    pub async fn add(&self, sheet_id: u64, data: &[SheetData]) -> Result<TaskOutcome> {
        self.write(HttpMethod::Post, format!("/sheets/{}/add", sheet_id), data).await
    }

    async fn write(&self, method: HttpMethod, path: String, data: &[SheetData]) -> Result<TaskOutcome> {
        tracing::info!("📤 {} {} with {} members", method.as_str(), path, data.len());
        self.client
            .run_task(method, &path, &SheetDataBody { member_data: data })
            .await
    }
}
