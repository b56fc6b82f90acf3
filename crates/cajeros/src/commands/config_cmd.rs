//! Config subcommand handlers.

use dialoguer::{Input, Select};

use cajeros_config::{Config, Profile};
use cajeros_core::BackendKind;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, save_config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Copy of `cfg` with plaintext secrets masked, for display.
fn redacted(cfg: &Config) -> Config {
    let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: cajeros_config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
            polling_interval_ms: cfg.defaults.polling_interval_ms,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                p.api_key = mask(&p.api_key);
                p.password = mask(&p.password);
                (name.clone(), p)
            })
            .collect(),
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `key = value` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "url" => profile.url = value,
        "backend" => profile.backend = parse_value(key, &value, "'rest' or 'table'")?,
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "username" | "user" => profile.username = Some(value),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number (seconds)")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "realtime" => profile.realtime = Some(parse_value(key, &value, "'true' or 'false'")?),
        "polling_interval_ms" | "polling-interval-ms" => {
            profile.polling_interval_ms =
                Some(parse_value(key, &value, "a number (milliseconds)")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, backend, api_key, \
                     api_key_env, username, insecure, timeout, ca_cert, realtime, \
                     polling_interval_ms"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;
            save_config(&cfg)?;
            output::print_notice(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: cajeros config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::print_notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => store_in_keyring(global, "password", "Password"),

        ConfigCommand::SetApiKey => store_in_keyring(global, "api-key", "API key"),
    }
}

fn store_in_keyring(global: &GlobalOpts, key: &str, label: &str) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    if !cfg.profiles.contains_key(&profile_name) {
        return Err(profile_not_found(&cfg, profile_name));
    }

    let secret = rpassword::prompt_password(format!("{label} for profile '{profile_name}': "))?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: key.into(),
            reason: format!("{label} cannot be empty"),
        });
    }

    cajeros_config::store_secret(&profile_name, key, &secret)?;
    output::print_notice(
        &format!("✓ {label} stored in system keyring for profile '{profile_name}'"),
        global.quiet,
    );
    Ok(())
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("cajeros configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let backend_choices = &["REST service", "Hosted table backend"];
    let backend = match Select::new()
        .with_prompt("Backend")
        .items(backend_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => BackendKind::Rest,
        _ => BackendKind::Table,
    };

    let default_url = match backend {
        BackendKind::Rest => "http://localhost:3000",
        BackendKind::Table => "https://project.example.co",
    };
    let url: String = Input::new()
        .with_prompt("Service URL")
        .default(default_url.into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_key = if backend == BackendKind::Table {
        let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "api_key".into(),
                reason: "API key cannot be empty".into(),
            });
        }
        if offer_keyring("API key")? {
            cajeros_config::store_secret(&profile_name, "api-key", &key)?;
            eprintln!("   ✓ API key stored in system keyring");
            None
        } else {
            Some(key)
        }
    } else {
        None
    };

    let username: String = Input::new()
        .with_prompt("Administrator name")
        .interact_text()
        .map_err(prompt_err)?;

    let pass = rpassword::prompt_password("Password (empty to prompt each time): ")
        .map_err(prompt_err)?;
    let password = if pass.is_empty() {
        None
    } else if offer_keyring("password")? {
        cajeros_config::store_secret(&profile_name, "password", &pass)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(pass)
    };

    let profile = Profile {
        url,
        backend,
        api_key,
        username: Some(username),
        password,
        ..Profile::default()
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: cajeros login");
    Ok(())
}

fn offer_keyring(what: &str) -> Result<bool, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {what}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    Ok(selection == 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_parses_typed_values() {
        let mut p = Profile::default();
        set_key(&mut p, "backend", "table".into()).unwrap();
        set_key(&mut p, "timeout", "12".into()).unwrap();
        set_key(&mut p, "realtime", "false".into()).unwrap();
        assert_eq!(p.backend, BackendKind::Table);
        assert_eq!(p.timeout, Some(12));
        assert_eq!(p.realtime, Some(false));
    }

    #[test]
    fn set_key_rejects_unknown_and_malformed() {
        let mut p = Profile::default();
        assert!(set_key(&mut p, "site", "x".into()).is_err());
        assert!(set_key(&mut p, "timeout", "soon".into()).is_err());
        assert!(set_key(&mut p, "backend", "graphql".into()).is_err());
    }

    #[test]
    fn show_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "http://localhost:3000".into(),
                api_key: Some("anon-key".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = format!("{:?}", redacted(&cfg));
        assert!(!shown.contains("anon-key"));
        assert!(!shown.contains("hunter2"));
    }
}
