mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cajeros_core::Dashboard;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a service connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "cajeros", &mut std::io::stdout());
            Ok(())
        }

        // Everything else acts on behalf of a logged-in administrator
        cmd => {
            let cfg = config::load_config_or_default();
            let (profile_name, profile) = config::effective_profile(&cli.global, &cfg)?;
            let connection = config::connection_config(&cli.global, &cfg, &profile_name, &profile)?;
            let dashboard = Dashboard::new(connection)?;

            let (username, password) = config::login_credentials(&profile, &profile_name)?;
            let session = dashboard
                .login(&username, &password)
                .await
                .map_err(|e| CliError::from(e).with_profile(&profile_name))?;

            tracing::debug!(command = ?cmd, admin = %session.admin_id(), "dispatching command");
            let ctx = commands::Context {
                dashboard: &dashboard,
                global: &cli.global,
                profile_name: &profile_name,
                password: &password,
            };
            commands::dispatch(cmd, &ctx).await
        }
    }
}
