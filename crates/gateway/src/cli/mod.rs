pub mod config;
pub mod stage;
pub mod tenant;

use clap::{Parser, Subcommand};

/// wave: a conversation pipeline for chat-based AI clones.
#[derive(Debug, Parser)]
#[command(name = "wave", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage per-tenant settings.
    #[command(subcommand)]
    Tenant(TenantCommand),
    /// Run pipeline stages without the HTTP server.
    #[command(subcommand)]
    Stage(StageCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
    /// Store an API key in the OS keychain for a provider.
    SetSecret {
        /// Provider ID from config.toml.
        provider_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Create the settings record for a business phone number.
    Create {
        /// Phone number ARN that receives the tenant's messages.
        tenant_key: String,
        /// Display name; also prefixes workflow execution names.
        name: String,
        /// Overwrite an existing record without asking.
        #[arg(short, long)]
        force: bool,
    },
    /// Print a tenant record with deployment defaults applied.
    Show {
        tenant_key: String,
    },
    /// Store the speech provider key on a tenant record (hidden prompt).
    SetSpeechKey {
        tenant_key: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum StageCommand {
    /// Invoke one stage with a JSON payload and print its output.
    Invoke {
        /// Stage name, e.g. `session-manager` or `generate-response`.
        stage: String,
        /// JSON input file; reads stdin when omitted.
        #[arg(long)]
        input: Option<String>,
        /// Execution budget for the call in milliseconds.
        #[arg(long)]
        remaining_ms: Option<u64>,
    },
    /// List the stage names.
    List,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `WV_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: wv_domain::config::Config
pub fn load_config() -> anyhow::Result<(wv_domain::config::Config, String)> {
    let config_path = std::env::var("WV_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// Parse the file at `path`, or fall back to defaults when it is absent.
pub fn load_config_from(path: &str) -> anyhow::Result<wv_domain::config::Config> {
    if !std::path::Path::new(path).exists() {
        return Ok(wv_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}
