//! Command dispatch: bridges CLI args -> dashboard operations -> output formatting.

pub mod admins;
pub mod config_cmd;
pub mod devices;
pub mod login;
pub mod macros;
pub mod util;

use secrecy::SecretString;

use cajeros_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a handler needs once the administrator is logged in.
pub struct Context<'a> {
    pub dashboard: &'a Dashboard,
    pub global: &'a GlobalOpts,
    pub profile_name: &'a str,
    pub password: &'a SecretString,
}

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(ctx, &args),
        Command::Devices(args) => devices::handle(ctx, args).await,
        Command::Admins(args) => admins::handle(ctx, args).await,
        Command::Macro(args) => macros::handle(ctx, args).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
