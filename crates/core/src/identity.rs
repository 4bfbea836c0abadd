//! The acting user as seen by the workflow.

use serde::{Deserialize, Serialize};

use crate::roles::{role_has_capability, Capability};
use crate::types::DbId;

/// The current user, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl Actor {
    pub fn new(
        id: DbId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        role_has_capability(&self.role, capability)
    }
}
