//! Shared helpers for command handlers.

use cajeros_core::{AdminId, Dashboard, DeviceId};

use crate::error::CliError;

/// Resolve a device identifier (numeric ID or exact name).
pub async fn resolve_device_id(dashboard: &Dashboard, identifier: &str) -> Result<DeviceId, CliError> {
    if let Ok(id) = identifier.parse::<DeviceId>() {
        return Ok(id);
    }
    dashboard
        .device_id_by_name(identifier)
        .await?
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

/// Resolve an administrator identifier (numeric ID or exact name).
pub async fn resolve_admin_id(dashboard: &Dashboard, identifier: &str) -> Result<AdminId, CliError> {
    if let Ok(id) = identifier.parse::<AdminId>() {
        return Ok(id);
    }
    dashboard
        .admin_id_by_name(identifier)
        .await?
        .ok_or_else(|| CliError::NotFound {
            resource_type: "administrator".into(),
            identifier: identifier.into(),
            list_command: "admins list".into(),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Prompt twice for a new password and require both entries to match.
pub fn prompt_new_password() -> Result<String, CliError> {
    let first = rpassword::prompt_password("New password: ")?;
    let second = rpassword::prompt_password("Repeat password: ")?;
    if first != second {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "entries do not match".into(),
        });
    }
    if first.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(first)
}
