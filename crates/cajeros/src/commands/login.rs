//! Login handler. The session itself is opened before dispatch; this
//! reports it and optionally persists the password.

use secrecy::ExposeSecret;
use serde::Serialize;

use crate::cli::LoginArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct LoginSummary {
    id: i64,
    name: String,
    privileged: bool,
    started_at: String,
}

pub fn handle(ctx: &Context<'_>, args: &LoginArgs) -> Result<(), CliError> {
    let session = ctx.dashboard.session().ok_or_else(|| CliError::PermissionDenied {
        message: "Not logged in".into(),
    })?;

    if args.save {
        cajeros_config::store_secret(ctx.profile_name, "password", ctx.password.expose_secret())?;
        output::print_notice(
            &format!("✓ Password stored in system keyring for profile '{}'", ctx.profile_name),
            ctx.global.quiet,
        );
    }

    let summary = LoginSummary {
        id: session.admin_id().get(),
        name: session.admin().name.clone(),
        privileged: session.is_privileged(),
        started_at: session.started_at().to_rfc3339(),
    };
    let out = output::render_single(
        &ctx.global.output,
        &summary,
        |s| {
            let role = if s.privileged { "administrator" } else { "operator" };
            format!("Logged in as {} (id {}, {role})", s.name, s.id)
        },
        |s| s.id.to_string(),
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
