// ── Login session ──
//
// Created by a successful authentication, dropped on logout. Privilege
// checks here are a client-side convenience; the backend remains the
// authority over what an administrator may do.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{AdminId, Administrator};

#[derive(Debug, Clone)]
pub struct Session {
    admin: Administrator,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(admin: Administrator) -> Self {
        Self {
            admin,
            started_at: Utc::now(),
        }
    }

    pub fn admin(&self) -> &Administrator {
        &self.admin
    }

    pub fn admin_id(&self) -> AdminId {
        self.admin.id
    }

    pub fn is_privileged(&self) -> bool {
        self.admin.is_privileged
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fail with `PermissionDenied` unless the administrator is privileged.
    pub fn require_privilege(&self, action: &str) -> Result<(), CoreError> {
        if self.admin.is_privileged {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                action: action.to_owned(),
            })
        }
    }
}
