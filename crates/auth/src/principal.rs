use serde::{Deserialize, Serialize};

use stockforge_core::PrincipalId;

/// Identity of an authenticated principal (human operator, service account).
///
/// Ownership checks elsewhere key on `id`; `name` is display-only and not
/// required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
}

impl Principal {
    pub fn new(id: PrincipalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
