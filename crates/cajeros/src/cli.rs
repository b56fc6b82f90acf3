//! Clap derive structures for the `cajeros` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cajeros -- administer cajeros devices from the command line
#[derive(Debug, Parser)]
#[command(
    name = "cajeros",
    version,
    about = "Administer cajeros devices, administrators and the payment macro",
    long_about = "Dashboard for cajeros devices grouped under administrators.\n\n\
        Talks to either the REST service or the hosted table backend; live\n\
        views use the realtime feed when available and poll otherwise.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 'p', env = "CAJEROS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service URL (overrides profile)
    #[arg(long, short = 'u', env = "CAJEROS_URL", global = true)]
    pub url: Option<String>,

    /// Backend shape (overrides profile)
    #[arg(long, short = 'b', env = "CAJEROS_BACKEND", global = true)]
    pub backend: Option<BackendArg>,

    /// API key for the table backend
    #[arg(long, env = "CAJEROS_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Administrator name to log in as
    #[arg(long, short = 'U', env = "CAJEROS_USERNAME", global = true)]
    pub user: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CAJEROS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CAJEROS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CAJEROS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Disable the realtime feed; live views poll instead
    #[arg(long, global = true)]
    pub no_realtime: bool,

    /// Polling period in milliseconds (overrides profile)
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    /// REST service with `{success, data}` envelopes
    Rest,
    /// Hosted table API with realtime feed
    Table,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StatusArg {
    #[default]
    All,
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LineStatusArg {
    /// Online
    Open,
    /// Offline
    Close,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify credentials and optionally store the password
    Login(LoginArgs),

    /// List, watch and edit devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage administrators and their device assignments
    #[command(alias = "adm")]
    Admins(AdminsArgs),

    /// Show or change the payment macro
    Macro(MacroArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Store the password in the system keyring after a successful login
    #[arg(long)]
    pub save: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

/// Filters shared by `devices list` and `devices watch`.
#[derive(Debug, Args)]
pub struct DeviceFilterArgs {
    /// Every device instead of the logged-in administrator's
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Case-insensitive name substring
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Line status filter
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusArg,
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    #[command(flatten)]
    pub filter: DeviceFilterArgs,

    /// Add a cost column: this amount divided by each device's daily count
    #[arg(long, value_name = "AMOUNT")]
    pub investment: Option<f64>,
}

/// Fields accepted by `devices update`. Omitted flags leave the field
/// unchanged.
#[derive(Debug, Args)]
pub struct DeviceFieldArgs {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// Line status
    #[arg(long)]
    pub status: Option<LineStatusArg>,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Remove the contact phone number
    #[arg(long, conflicts_with = "phone")]
    pub clear_phone: bool,

    /// Group identifier
    #[arg(long)]
    pub group: Option<String>,

    /// Remove the group identifier
    #[arg(long, conflicts_with = "group")]
    pub clear_group: bool,

    /// Current counter
    #[arg(long)]
    pub count: Option<i64>,

    /// Counter limit
    #[arg(long)]
    pub max_count: Option<i64>,

    /// Daily counter
    #[arg(long)]
    pub daily_count: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show one device
    Get {
        /// Device ID or name
        device: String,
    },

    /// Print the device list and refresh it as the service changes
    Watch(DeviceFilterArgs),

    /// Edit a device
    Update {
        /// Device ID or name
        device: String,

        #[command(flatten)]
        fields: DeviceFieldArgs,
    },

    /// Register a new device (table backend, privileged)
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Contact phone number
        #[arg(long)]
        phone: Option<String>,

        /// Group identifier
        #[arg(long)]
        group: Option<String>,

        /// Counter limit
        #[arg(long, default_value = "0")]
        max_count: i64,
    },
}

// ── Administrators ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AdminsArgs {
    #[command(subcommand)]
    pub command: AdminsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminsCommand {
    /// List administrators
    #[command(alias = "ls")]
    List,

    /// Edit an administrator (privileged)
    Update {
        /// Administrator ID or name
        admin: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Prompt for a new password
        #[arg(long)]
        password: bool,

        /// Grant or revoke administrator privilege
        #[arg(long)]
        privileged: Option<bool>,
    },

    /// Show the devices assigned to an administrator
    Devices {
        /// Administrator ID or name
        admin: String,
    },

    /// Replace an administrator's device assignments (table backend, privileged)
    Assign {
        /// Administrator ID or name
        admin: String,

        /// Device IDs or names; none clears every assignment
        devices: Vec<String>,
    },
}

// ── Macro ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MacroArgs {
    #[command(subcommand)]
    pub command: MacroCommand,
}

#[derive(Debug, Subcommand)]
pub enum MacroCommand {
    /// Show the current macro values
    Show,

    /// Change one or both macro values (privileged)
    Set {
        /// Account used for 90% transfers
        #[arg(long)]
        cbu90: Option<String>,

        /// Account used for 100% transfers
        #[arg(long)]
        cbu100: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a key on the active profile
    Set {
        /// url, backend, api_key, api_key_env, username, insecure, timeout,
        /// ca_cert, realtime, polling_interval_ms
        key: String,

        /// New value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the administrator password in the system keyring
    SetPassword,

    /// Store the table backend API key in the system keyring
    SetApiKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
