//! Clap derive structures for the `valo` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use valo_core::{BulbId, GroupId, LightState, codec};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// valo -- control networked lights through their gateway
#[derive(Debug, Parser)]
#[command(
    name = "valo",
    version,
    about = "Control networked lights through their gateway",
    long_about = "List, rename, and set the color of lights and light groups managed by a\n\
        smart-lighting gateway. One gateway session is shared by every command\n\
        in a run and closed on exit.",
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
    /// Gateway address (overrides config)
    #[arg(long, short = 'g', env = "VALO_APP_GATEWAY_ADDRESS", global = true)]
    pub gateway: Option<String>,

    /// Gateway security code (overrides config)
    #[arg(
        long,
        env = "VALO_APP_GATEWAY_SECURITY_CODE",
        global = true,
        hide_env_values = true
    )]
    pub security_code: Option<String>,

    /// Per-command timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Use the built-in simulated gateway instead of a real one
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Config file to read instead of the default location
    #[arg(long, env = "VALO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VALO_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON response envelope
    Json,
    /// Compact single-line JSON response envelope
    JsonCompact,
    /// YAML response envelope
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

impl OutputFormat {
    /// Whether this format emits the `{status: ...}` envelope.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact | Self::Yaml)
    }
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, inspect, rename, and color light groups
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Inspect, rename, and color individual bulbs
    #[command(alias = "b")]
    Bulbs(BulbsArgs),

    /// Turn every light on or off at once
    SwitchAll {
        /// Target power state
        state: PowerState,
    },

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List all groups
    #[command(alias = "ls")]
    List,

    /// Show one group with its bulbs
    Show {
        /// Group ID
        id: GroupId,
    },

    /// Rename a group
    Rename {
        /// Group ID
        id: GroupId,
        /// New name
        name: String,
    },

    /// Set every bulb in a group to one color
    SetLight {
        /// Group ID
        id: GroupId,
        #[command(flatten)]
        light: LightArgs,
    },
}

// ── Bulbs ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BulbsArgs {
    #[command(subcommand)]
    pub command: BulbsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BulbsCommand {
    /// List the bulbs of a group
    #[command(alias = "ls")]
    List {
        /// Group ID
        group: GroupId,
    },

    /// Show one bulb
    Show {
        /// Bulb (accessory) ID
        id: BulbId,
    },

    /// Rename a bulb
    Rename {
        /// Bulb (accessory) ID
        id: BulbId,
        /// New name
        name: String,
    },

    /// Set a bulb's color, intensity, and power
    SetLight {
        /// Bulb (accessory) ID
        id: BulbId,
        #[command(flatten)]
        light: LightArgs,
    },
}

// ── Light arguments ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LightArgs {
    /// Color as rrggbb hex (leading '#' optional)
    #[arg(long, default_value = "ffffff", value_parser = parse_rgb)]
    pub rgb: Rgb,

    /// Intensity between 0 and 1
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Turn the light off instead of on
    #[arg(long)]
    pub off: bool,
}

impl LightArgs {
    pub fn to_state(&self) -> LightState {
        let Rgb(red, green, blue) = self.rgb;
        LightState::new(red, green, blue, self.alpha, !self.off)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    codec::parse_color_hex(hex)
        .map(|(r, g, b)| Rgb(r, g, b))
        .map_err(|e| e.to_string())
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration (security code masked)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
