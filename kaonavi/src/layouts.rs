//! Layouts de membros e sheets

use crate::client::KaonaviClient;
use crate::error::Result;
use crate::types::{MemberLayout, SheetLayout};

/// Operações sobre `/member_layouts` e `/sheet_layouts`
pub struct Layouts<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Layouts<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Layout do cadastro básico (campos fixos + custom fields)
    pub async fn member_layout(&self) -> Result<MemberLayout> {
        self.client.read_json("/member_layouts").await
    }

    /// Todas as sheets (envelope `sheets`)
    pub async fn sheet_layouts(&self) -> Result<Vec<SheetLayout>> {
        self.client.read_envelope("/sheet_layouts", "sheets").await
    }

    pub async fn sheet_layout(&self, sheet_id: u64) -> Result<SheetLayout> {
        self.client
            .read_json(&format!("/sheet_layouts/{}", sheet_id))
            .await
    }
}
