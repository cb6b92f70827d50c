//! Árvore de departamentos

use serde::Serialize;

use crate::client::KaonaviClient;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::tasks::TaskOutcome;
use crate::types::DepartmentTree;

#[derive(Serialize)]
struct DepartmentBody<'a> {
    department_data: &'a [DepartmentTree],
}

/// Operações sobre `/departments`
pub struct Departments<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Departments<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Todos os departamentos (envelope `department_data`)
    pub async fn list(&self) -> Result<Vec<DepartmentTree>> {
        self.client.read_envelope("/departments", "department_data").await
    }

    /// Substitui a árvore inteira
    pub async fn replace(&self, departments: &[DepartmentTree]) -> Result<TaskOutcome> {
        tracing::info!("📤 Replacing Kaonavi department tree ({} nodes)", departments.len());
        self.client
            .run_task(
                HttpMethod::Put,
                "/departments",
                &DepartmentBody {
                    department_data: departments,
                },
            )
            .await
    }
}
