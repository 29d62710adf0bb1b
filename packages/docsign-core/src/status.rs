//! System status summary.

use serde::Serialize;

use crate::error::Result;
use crate::identity::username_from_private_key_name;
use crate::signer::is_companion_artifact;
use crate::storage::{ArtifactStore, Category};

/// Registered users, signed documents and the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    /// Usernames owning a private key in `keys/`
    pub users: Vec<String>,
    /// Document names in `signed_docs/` (signatures and certificate copies excluded)
    pub signed_documents: Vec<String>,
    /// Username of the active session
    pub current_user: Option<String>,
}

impl SystemStatus {
    /// Read the status from the store
    pub fn collect(store: &ArtifactStore, current_user: Option<&str>) -> Result<Self> {
        let users = store
            .list(Category::Keys)?
            .iter()
            .filter_map(|name| username_from_private_key_name(name))
            .map(str::to_string)
            .collect();

        let signed_documents = store
            .list(Category::SignedDocs)?
            .into_iter()
            .filter(|name| !is_companion_artifact(name))
            .collect();

        Ok(Self {
            users,
            signed_documents,
            current_user: current_user.map(str::to_string),
        })
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Users: {} | Signed Docs: {}",
            self.users.len(),
            self.signed_documents.len()
        )?;
        if let Some(user) = &self.current_user {
            write!(f, " | Current: {}", user)?;
        }
        Ok(())
    }
}
