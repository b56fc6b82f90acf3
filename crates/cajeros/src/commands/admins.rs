//! Administrator command handlers.

use secrecy::SecretString;
use tabled::Tabled;

use cajeros_core::{AdminPatch, Administrator, DeviceId};

use crate::cli::{AdminsArgs, AdminsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AdminRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Privileged")]
    privileged: String,
}

impl From<&Administrator> for AdminRow {
    fn from(a: &Administrator) -> Self {
        Self {
            id: a.id.to_string(),
            name: a.name.clone(),
            privileged: if a.is_privileged { "yes" } else { "no" }.into(),
        }
    }
}

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "Device ID")]
    id: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context<'_>, args: AdminsArgs) -> Result<(), CliError> {
    match args.command {
        AdminsCommand::List => {
            let admins = ctx.dashboard.list_admins().await?;
            let out = output::render_list(&ctx.global.output, &admins, |a| AdminRow::from(a), |a| {
                a.id.to_string()
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        AdminsCommand::Update {
            admin,
            name,
            password,
            privileged,
        } => {
            let password = if password {
                Some(SecretString::from(util::prompt_new_password()?))
            } else {
                None
            };
            let patch = AdminPatch {
                name,
                password,
                is_privileged: privileged,
            };
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass --name, --password or --privileged".into(),
                });
            }

            let id = util::resolve_admin_id(ctx.dashboard, &admin).await?;
            ctx.dashboard.update_admin(id, &patch).await?;
            output::print_notice(&format!("✓ Administrator {id} updated"), ctx.global.quiet);
            Ok(())
        }

        AdminsCommand::Devices { admin } => {
            let id = util::resolve_admin_id(ctx.dashboard, &admin).await?;
            let ids = ctx.dashboard.assigned_devices(id).await?;
            let out = output::render_list(
                &ctx.global.output,
                &ids,
                |d| AssignmentRow { id: d.to_string() },
                ToString::to_string,
            );
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        AdminsCommand::Assign { admin, devices } => {
            let id = util::resolve_admin_id(ctx.dashboard, &admin).await?;
            let mut device_ids: Vec<DeviceId> = Vec::with_capacity(devices.len());
            for device in &devices {
                device_ids.push(util::resolve_device_id(ctx.dashboard, device).await?);
            }

            if device_ids.is_empty()
                && !util::confirm(
                    &format!("Remove every device assignment from administrator {id}?"),
                    ctx.global.yes,
                )?
            {
                return Ok(());
            }

            ctx.dashboard.assign_devices(id, &device_ids).await?;
            output::print_notice(
                &format!(
                    "✓ Administrator {id} now has {} device(s) assigned",
                    device_ids.len()
                ),
                ctx.global.quiet,
            );
            Ok(())
        }
    }
}
