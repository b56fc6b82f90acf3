//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use cajeros_config::ConfigError;
use cajeros_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}: {reason}")]
    #[diagnostic(
        code(cajeros::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Self-signed certificates need --insecure (-k) or ca_cert in the profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(cajeros::auth_failed),
        help(
            "Verify the administrator name and password.\n\
             Run: cajeros config set-password --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(cajeros::no_credentials),
        help(
            "Configure credentials with: cajeros config init\n\
             Or set CAJEROS_USERNAME / CAJEROS_PASSWORD / CAJEROS_API_KEY."
        )
    )]
    NoCredentials { profile: String, what: String },

    #[error("{message}")]
    #[diagnostic(
        code(cajeros::permission_denied),
        help("Log in as an administrator with privilege, or ask one to do this.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(cajeros::not_found),
        help("Run: cajeros {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Backend ──────────────────────────────────────────────────────
    /// The service's own message, shown verbatim.
    #[error("{message}")]
    #[diagnostic(code(cajeros::rejected))]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(cajeros::partial_failure),
        help("Existing assignments were removed but the new set was not saved. Re-run the command.")
    )]
    PartialFailure { message: String },

    #[error("{message}")]
    #[diagnostic(code(cajeros::api_error))]
    ApiError { message: String },

    #[error("'{operation}' is not available on the {backend} backend")]
    #[diagnostic(
        code(cajeros::unsupported),
        help("Use a profile with backend = \"table\" for this command.")
    )]
    Unsupported { operation: String, backend: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cajeros::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cajeros::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cajeros config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No service configured")]
    #[diagnostic(
        code(cajeros::no_config),
        help(
            "Create a profile with: cajeros config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(cajeros::config))]
    Config(String),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(cajeros::timeout),
        help("Increase timeout with --timeout or check the service.")
    )]
    Timeout,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Point auth-failure help text at the profile actually in use.
    pub fn with_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                message,
                profile: name.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                message,
                profile: "default".into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: match entity_type.as_str() {
                    "macro" => "macro show".into(),
                    other => format!("{other}s list"),
                },
                resource_type: entity_type,
                identifier,
            },

            CoreError::Unsupported { operation, backend } => {
                CliError::Unsupported { operation, backend }
            }

            CoreError::Rejected { message } => CliError::Rejected { message },

            err @ CoreError::PartialFailure { .. } => CliError::PartialFailure {
                message: err.to_string(),
            },

            err @ (CoreError::PermissionDenied { .. } | CoreError::NotLoggedIn) => {
                CliError::PermissionDenied {
                    message: err.to_string(),
                }
            }

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }

            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile, what } => CliError::NoCredentials {
                profile,
                what: what.into(),
            },
            ConfigError::UnknownProfile(name) => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_passes_through_verbatim() {
        let err = CliError::from(CoreError::Rejected {
            message: "El cajero ya existe".into(),
        });
        assert_eq!(err.to_string(), "El cajero ya existe");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn partial_failure_keeps_completed_step() {
        let err = CliError::from(CoreError::PartialFailure {
            completed: "previous assignments deleted".into(),
            message: "insert failed".into(),
        });
        assert_eq!(
            err.to_string(),
            "insert failed (partial update: previous assignments deleted)"
        );
        assert_eq!(err.exit_code(), exit_code::PARTIAL);
    }

    #[test]
    fn permission_and_login_errors_share_exit_code() {
        let denied = CliError::from(CoreError::PermissionDenied {
            action: "update the macro".into(),
        });
        let anon = CliError::from(CoreError::NotLoggedIn);
        assert_eq!(denied.exit_code(), exit_code::PERMISSION);
        assert_eq!(anon.exit_code(), exit_code::PERMISSION);
    }

    #[test]
    fn missing_macro_points_at_macro_show() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "macro".into(),
            identifier: "1".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            err,
            CliError::NotFound { ref list_command, .. } if list_command == "macro show"
        ));
    }

    #[test]
    fn auth_failure_exit_code() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "Credenciales incorrectas".into(),
        });
        assert_eq!(err.to_string(), "Credenciales incorrectas");
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
