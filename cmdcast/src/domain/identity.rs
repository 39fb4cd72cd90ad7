//! Node identity

use serde::{Deserialize, Serialize};

/// Role used when none is configured
pub const DEFAULT_ROLE: &str = "app";

/// Who this agent is: fixed at startup, read-only afterwards
///
/// Threaded into the targeting filter and the notifier at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    server_id: String,
    server_role: String,
}

impl NodeIdentity {
    pub fn new(server_id: impl Into<String>, server_role: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            server_role: server_role.into(),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn server_role(&self) -> &str {
        &self.server_role
    }

    /// Notification prefix: `*[<id>][<ROLE>]*`
    pub fn prefix(&self) -> String {
        format!("*[{}][{}]*", self.server_id, self.server_role.to_uppercase())
    }
}
