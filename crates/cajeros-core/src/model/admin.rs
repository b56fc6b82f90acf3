// ── Administrator domain types ──
//
// The credential is held as a secret and is never serialized; it is only
// ever written back through an explicit `AdminPatch`.

use secrecy::SecretString;
use serde::Serialize;

use super::entity_id::AdminId;

#[derive(Debug, Clone, Serialize)]
pub struct Administrator {
    pub id: AdminId,
    pub name: String,
    #[serde(skip)]
    pub password: Option<SecretString>,
    /// Gates administrative operations client-side.
    pub is_privileged: bool,
}

/// Partial administrator update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AdminPatch {
    pub name: Option<String>,
    pub password: Option<SecretString>,
    pub is_privileged: Option<bool>,
}

impl AdminPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none() && self.is_privileged.is_none()
    }
}
