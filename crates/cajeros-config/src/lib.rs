//! Shared configuration for cajeros tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `cajeros_core::ConnectionConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cajeros_core::{BackendKind, ConnectionConfig, TlsVerification};

/// Keyring service under which secrets are stored.
pub const KEYRING_SERVICE: &str = "cajeros";

/// Environment variable consulted first for the administrator password.
pub const PASSWORD_ENV: &str = "CAJEROS_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Polling period in milliseconds when realtime is unavailable.
    #[serde(default = "default_polling_interval")]
    pub polling_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            polling_interval_ms: default_polling_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_polling_interval() -> u64 {
    30_000
}

/// A named service profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Service URL: REST root (e.g. "http://localhost:3000") or table
    /// project root.
    pub url: String,

    /// Backend shape: "rest" or "table".
    #[serde(default)]
    pub backend: BackendKind,

    /// API key for the table backend (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Administrator name used by `login`.
    pub username: Option<String>,

    /// Administrator password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Use the realtime feed for live views (table backend only).
    pub realtime: Option<bool>,

    /// Override polling period (milliseconds).
    pub polling_interval_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "cajeros", "cajeros").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cajeros");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `CAJEROS_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CAJEROS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str, key: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{key}"))?)
}

/// Store a secret for `profile_name` in the system keyring.
///
/// `key` is `"api-key"` or `"password"`.
pub fn store_secret(profile_name: &str, key: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, key)?.set_password(secret)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, key: &str) -> Option<SecretString> {
    keyring_entry(profile_name, key)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(profile_name, "api-key") {
        return Ok(secret);
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: "API key",
    })
}

/// Resolve the administrator name and password for `login`.
pub fn resolve_login(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("CAJEROS_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
            what: "administrator name",
        })?;

    let password = resolve_password(profile, profile_name).ok_or_else(|| {
        ConfigError::NoCredentials {
            profile: profile_name.into(),
            what: "password",
        }
    })?;
    Ok((username, password))
}

/// Resolve the administrator password from env var, keyring, then
/// plaintext config. `None` lets the caller fall back to prompting.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring_secret(profile_name, "password") {
        return Some(pw);
    }

    // 3. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConnectionConfig` from a profile, with no CLI flag overrides.
///
/// The API key is only resolved (and only required) for the table backend.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let mut config = ConnectionConfig::new(url, profile.backend);

    if profile.backend == BackendKind::Table {
        config.api_key = Some(resolve_api_key(profile, profile_name)?);
    }

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.realtime_enabled = profile.realtime.unwrap_or(true);
    config.polling_interval = Duration::from_millis(
        profile
            .polling_interval_ms
            .unwrap_or(defaults.polling_interval_ms),
    );

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn rest_profile() -> Profile {
        Profile {
            url: "http://localhost:3000".into(),
            username: Some("ana".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "casa"

[defaults]
timeout = 12

[profiles.casa]
url = "https://proyecto.example.co"
backend = "table"
api_key = "anon"
realtime = false
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.active_profile_name(None), "casa");
        assert_eq!(cfg.defaults.timeout, 12);
        assert_eq!(cfg.defaults.polling_interval_ms, 30_000);

        let profile = cfg.profile("casa").unwrap();
        assert_eq!(profile.backend, BackendKind::Table);
        assert_eq!(profile.realtime, Some(false));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn unknown_profile_is_reported() {
        let cfg = Config::default();
        let err = cfg.profile("nope").unwrap_err();
        assert_eq!(err.to_string(), "profile 'nope' not found");
    }

    #[test]
    fn explicit_profile_wins() {
        let cfg = Config::default();
        assert_eq!(cfg.active_profile_name(Some("otro")), "otro");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), rest_profile());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("default").unwrap().url, "http://localhost:3000");
    }

    #[test]
    fn rest_profile_needs_no_api_key() {
        let config =
            profile_to_connection_config(&rest_profile(), "default", &Defaults::default()).unwrap();
        assert_eq!(config.backend, BackendKind::Rest);
        assert!(config.api_key.is_none());
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.polling_interval, Duration::from_millis(30_000));
    }

    #[test]
    fn api_key_env_takes_precedence_over_plaintext() {
        let profile = Profile {
            url: "https://proyecto.example.co".into(),
            backend: BackendKind::Table,
            api_key_env: Some("PATH".into()),
            api_key: Some("plaintext".into()),
            ..Profile::default()
        };

        let key = resolve_api_key(&profile, "cajeros-config-test").unwrap();
        assert_eq!(key.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn profile_overrides_defaults() {
        let profile = Profile {
            insecure: Some(true),
            timeout: Some(5),
            polling_interval_ms: Some(1_000),
            realtime: Some(false),
            ..rest_profile()
        };
        let config =
            profile_to_connection_config(&profile, "default", &Defaults::default()).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.polling_interval, Duration::from_millis(1_000));
        assert!(!config.realtime_enabled);
    }

    #[test]
    fn invalid_url_is_validation_error() {
        let profile = Profile {
            url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_connection_config(&profile, "default", &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "url"));
    }
}
