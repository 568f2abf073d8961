//! Clap derive structures for the `tankwatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tankwatch_core::TriggerMode;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tankwatch -- fuel-tank level monitor with automatic reordering
#[derive(Debug, Parser)]
#[command(
    name = "tankwatch",
    version,
    about = "Watch fuel-tank levels and place reorders automatically",
    long_about = "Follows a station's tank level from the level service, announces\n\
        full/empty thresholds, and files one automatic order with the order API\n\
        each time the tank drops to the reorder point.",
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
    /// Config file (default: platform config dir)
    #[arg(long, env = "TANKWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Level service URL (overrides config)
    #[arg(long, env = "TANKWATCH_LEVEL_URL", global = true)]
    pub level_url: Option<String>,

    /// Order API URL (overrides config)
    #[arg(long, env = "TANKWATCH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TANKWATCH_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON (one object per line when watching)
    JsonCompact,
    /// Bare values for scripting
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow the live level and reorder automatically
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Fetch the current level once
    #[command(alias = "l")]
    Level,

    /// List and approve orders
    #[command(alias = "o")]
    Orders(OrdersArgs),

    /// Manage the station identity used to attribute orders
    Session(SessionArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Reorder rule (overrides config)
    #[arg(long, value_parser = parse_trigger_mode)]
    pub trigger_mode: Option<TriggerMode>,

    /// Push channel URL (default: derived from the level service URL)
    #[arg(long, env = "TANKWATCH_FEED_URL")]
    pub feed_url: Option<String>,
}

fn parse_trigger_mode(raw: &str) -> Result<TriggerMode, String> {
    raw.parse()
        .map_err(|_| format!("expected 'crossing' or 'exact', got '{raw}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ORDERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List all orders
    #[command(alias = "ls")]
    List,

    /// Approve an order and mail the approval notice
    Approve {
        /// Order ID
        id: u64,

        /// Recipient of the approval notice (default: the order's requester)
        #[arg(long)]
        email: Option<String>,

        /// Skip the approval notice
        #[arg(long)]
        no_notify: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Show the resolved station identity
    Show,

    /// Store the station ID and/or email
    Set {
        /// Station ID
        #[arg(long)]
        station: Option<u64>,

        /// Email address that receives order notices
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored identity
    Clear,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file with all defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config and session file locations
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
