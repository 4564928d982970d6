//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::background::IdleState;

/// Photo screensaver background engine.
///
/// Drives the settings store, state dispatch, window placement and photo
/// sources from the command line. Use --json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "pss", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "PSS_FORMAT"
    )]
    pub format: OutputFormat,

    /// Equivalent to --format=json
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings database path
    #[arg(long, global = true, env = "PSS_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// Pretty JSON
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON.
    pub const fn use_json(&self) -> bool {
        self.json || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Settings ===
    /// Initialize or upgrade the settings store, then apply every setting
    Init(InitArgs),

    /// Print a setting (or all settings)
    Get(GetArgs),

    /// Store a setting and apply its effect
    Set(SetArgs),

    /// Delete a setting
    Unset(UnsetArgs),

    // === Runtime ===
    /// Re-apply the effect of a setting ("all" for everything)
    Process(ProcessArgs),

    /// Flip the enabled flag
    Toggle,

    /// Report a system idle state change
    Idle(IdleArgs),

    /// Fetch a 500px gallery and print the photos
    Fetch(FetchArgs),

    /// Open screensaver windows
    Show(ShowArgs),

    /// Ask every screensaver window to close
    Close,

    /// Show enabled state, badge, active window and cached photo counts
    Status,

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Reset every setting to its default (linked account, album
    /// selections and OS are kept)
    #[arg(long)]
    pub restore: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Setting key; omit to print all settings
    pub key: Option<String>,
}

/// Arguments for storing a setting.
///
/// # Examples
///
/// ```bash
/// pss set keepAwake true
/// pss set activeStart '"08:30"'
/// pss set idleTime '{"base": 10, "display": 10, "unit": 0}'
/// ```
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Setting key
    pub key: String,

    /// Value as JSON; bare words are stored as strings
    pub value: String,

    /// Store only, do not apply the effect
    #[arg(long)]
    pub no_apply: bool,
}

#[derive(Parser, Debug)]
pub struct UnsetArgs {
    /// Setting key
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// Setting key or "all"
    #[arg(default_value = "all")]
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct IdleArgs {
    /// New idle state
    pub state: IdleState,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Gallery: popular, editors, fresh_yesterday, ...
    #[arg(default_value = "popular")]
    pub gallery: String,

    /// 500px API consumer key
    #[arg(long, env = "PSS_500PX_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    /// Maximum number of photos to print (0 = all)
    #[arg(long, short = 'n', default_value = "0")]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Only one window, even with allDisplays set
    #[arg(long)]
    pub single: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
