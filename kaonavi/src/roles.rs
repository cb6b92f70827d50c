//! Roles de usuário

use crate::client::KaonaviClient;
use crate::error::Result;
use crate::types::Role;

/// Operações sobre `/roles`
pub struct Roles<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Roles<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Role>> {
        self.client.read_envelope("/roles", "role_data").await
    }
}
