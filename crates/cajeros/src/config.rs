//! CLI-side configuration: `GlobalOpts`-aware wrappers over `cajeros-config`.
//!
//! Core never sees these types; it receives a pre-built `ConnectionConfig`.

use std::io::IsTerminal;

use secrecy::SecretString;

use cajeros_config::{Config, Profile};
use cajeros_core::{BackendKind, ConnectionConfig};

use crate::cli::{BackendArg, GlobalOpts};
use crate::error::CliError;

pub use cajeros_config::{config_path, load_config_or_default, save_config};

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Rest => Self::Rest,
            BackendArg::Table => Self::Table,
        }
    }
}

/// Profile name chosen by `--profile`, then the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.active_profile_name(global.profile.as_deref())
}

/// The active profile with CLI flag overrides folded in.
///
/// Without a stored profile, `--url` alone is enough to describe one.
pub fn effective_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(p) => p.clone(),
        None if global.url.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: available.join(", "),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(backend) = global.backend {
        profile.backend = backend.into();
    }
    if let Some(ref user) = global.user {
        profile.username = Some(user.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.no_realtime {
        profile.realtime = Some(false);
    }
    if let Some(ms) = global.poll_interval {
        profile.polling_interval_ms = Some(ms);
    }

    Ok((name, profile))
}

/// Build the `ConnectionConfig` for this invocation.
///
/// An explicit `--api-key` wins over the profile's credential chain.
pub fn connection_config(
    global: &GlobalOpts,
    cfg: &Config,
    name: &str,
    profile: &Profile,
) -> Result<ConnectionConfig, CliError> {
    let Some(ref key) = global.api_key else {
        return Ok(cajeros_config::profile_to_connection_config(
            profile,
            name,
            &cfg.defaults,
        )?);
    };

    let mut keyed = profile.clone();
    keyed.api_key_env = None;
    keyed.api_key = Some(key.clone());
    let mut config = cajeros_config::profile_to_connection_config(&keyed, name, &cfg.defaults)?;
    config.api_key = Some(SecretString::from(key.clone()));
    Ok(config)
}

/// Administrator name and password for this invocation.
///
/// Falls back to an interactive prompt when no password is configured and
/// stdin is a terminal.
pub fn login_credentials(profile: &Profile, name: &str) -> Result<(String, SecretString), CliError> {
    let username = profile
        .username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: name.into(),
            what: "administrator name".into(),
        })?;

    if let Some(password) = cajeros_config::resolve_password(profile, name) {
        return Ok((username, password));
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: name.into(),
            what: "password".into(),
        });
    }

    let password = rpassword::prompt_password(format!("Password for {username}: "))?;
    Ok((username, SecretString::from(password)))
}
