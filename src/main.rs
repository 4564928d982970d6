//! Photo screensaver CLI - drives the background engine from a terminal.
//!
//! Human-friendly text by default, JSON with --json for scripts.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::sync::Arc;

use clap::Parser;
use console::style;
use serde::Serialize;
use serde_json::Value;

use pss::background::Background;
use pss::cli::{self, Cli, Commands};
use pss::config::{SafeSetter, Settings, SqliteStore, resolve_db_path};
use pss::display::{Placement, PlacementReport};
use pss::error::{PssError, Result, ResultExt};
use pss::logging::init_logging;
use pss::messaging::{LocalBus, MessageBus};
use pss::photos::{GalleryCache, PhotoSourceKey, PhotoSources, Px500, ReqwestClient};
use pss::platform::Platform;
use pss::platform::headless::HeadlessPlatform;
use pss::schedule::{self, ActiveWindow};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

/// Environment variable holding the 500px API consumer key.
const CONSUMER_KEY_ENV: &str = "PSS_500PX_KEY";

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    // One event loop for the whole engine
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to start runtime")
        .and_then(|rt| rt.block_on(run(&cli)));

    if let Err(e) = result {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Init(args)) => cmd_init(cli, args).await,
        Some(Commands::Get(args)) => cmd_get(cli, args),
        Some(Commands::Set(args)) => cmd_set(cli, args).await,
        Some(Commands::Unset(args)) => cmd_unset(cli, args).await,
        Some(Commands::Process(args)) => cmd_process(cli, args).await,
        Some(Commands::Toggle) => cmd_toggle(cli),
        Some(Commands::Idle(args)) => cmd_idle(cli, args).await,
        Some(Commands::Fetch(args)) => cmd_fetch(cli, args).await,
        Some(Commands::Show(args)) => cmd_show(cli, args).await,
        Some(Commands::Close) => cmd_close(cli),
        Some(Commands::Status) => cmd_status(cli).await,
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(cli, args),
    }
}

// === Engine ===

/// Open the settings database and wire the engine around it.
fn open_engine(cli: &Cli) -> Result<Background> {
    let path = resolve_db_path(cli.db.as_deref())?;
    let store = SqliteStore::open(&path)?;
    let settings = Settings::new(Arc::new(store));

    let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new());
    let cache = Arc::new(GalleryCache::new(SafeSetter::new(settings.clone(), bus.clone())));
    let consumer_key = std::env::var(CONSUMER_KEY_ENV).unwrap_or_default();
    let sources =
        PhotoSources::new(cache).with_500px(Arc::new(ReqwestClient::new()?), &consumer_key);

    let platform = Arc::new(HeadlessPlatform::new());
    Ok(Background::new(
        settings,
        Platform::from_shared(&platform),
        Arc::new(sources),
        bus,
    ))
}

// === Quick Start ===

fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        return output_json(
            cli,
            &serde_json::json!({
                "tool": "pss",
                "version": build_info::VERSION,
                "settings": {
                    "initialize": "pss init",
                    "restore_defaults": "pss init --restore",
                    "read": "pss get [KEY]",
                    "write": "pss set <KEY> <JSON>",
                },
                "runtime": {
                    "apply": "pss process [KEY|all]",
                    "toggle": "pss toggle",
                    "idle": "pss idle <active|idle|locked>",
                    "show": "pss show [--single]",
                    "close": "pss close",
                    "status": "pss status",
                },
                "photos": "pss fetch <GALLERY> --consumer-key <KEY>",
            }),
        );
    }

    println!("{} {} - photo screensaver engine\n", style("pss").bold().cyan(), build_info::VERSION);
    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  Initialize settings", style("pss init").green());
    println!("  {}  Show current state", style("pss status").green());
    println!("  {}  Keep the display awake", style("pss set keepAwake true").green());
    println!("  {}  Open the screensaver", style("pss show").green());
    println!("  {}  Fetch a 500px gallery", style("pss fetch popular").green());
    println!();
    println!("Run {} for full help", style("pss --help").yellow());
    Ok(())
}

// === Settings Commands ===

async fn cmd_init(cli: &Cli, args: &cli::InitArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    bg.on_installed(args.restore).await?;
    let version = bg.settings().get_int(pss::config::defaults::key::VERSION)?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "version": version, "restored": args.restore }),
        )
    } else {
        let action = if args.restore { "restored to defaults" } else { "initialized" };
        println!(
            "{} Settings {action} (version {})",
            style("✓").green(),
            version.unwrap_or_default()
        );
        Ok(())
    }
}

fn cmd_get(cli: &Cli, args: &cli::GetArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    let settings = bg.settings();

    if let Some(key) = &args.key {
        let value = settings.get_value(key)?;
        if cli.use_json() {
            return output_json(cli, &serde_json::json!({ "key": key, "value": value }));
        }
        match value {
            Some(v) => println!("{v}"),
            None => println!("{}", style("(not set)").dim()),
        }
        return Ok(());
    }

    let all: serde_json::Map<String, Value> = settings
        .snapshot()?
        .into_iter()
        .map(|(k, raw)| {
            let v = match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(_) => Value::String(raw),
            };
            (k, v)
        })
        .collect();

    if cli.use_json() {
        output_json(cli, &all)
    } else {
        for (k, v) in &all {
            println!("{} = {v}", style(k).cyan());
        }
        Ok(())
    }
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

async fn cmd_set(cli: &Cli, args: &cli::SetArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    let value = parse_value(&args.value);
    bg.settings().set_value(&args.key, &value)?;
    if !args.no_apply {
        bg.on_setting_changed(&args.key).await?;
    }

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "key": args.key, "value": value, "applied": !args.no_apply }),
        )
    } else {
        println!("{} {} = {value}", style("✓").green(), args.key);
        Ok(())
    }
}

async fn cmd_unset(cli: &Cli, args: &cli::UnsetArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    bg.settings().remove(&args.key)?;
    bg.on_setting_changed(&args.key).await?;

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "key": args.key, "removed": true }))
    } else {
        println!("{} {} removed", style("✓").green(), args.key);
        Ok(())
    }
}

// === Runtime Commands ===

async fn cmd_process(cli: &Cli, args: &cli::ProcessArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    bg.dispatcher().process_state(&args.key).await?;

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "processed": args.key }))
    } else {
        println!("{} Processed {}", style("✓").green(), args.key);
        Ok(())
    }
}

fn cmd_toggle(cli: &Cli) -> Result<()> {
    let bg = open_engine(cli)?;
    let enabled = bg.dispatcher().toggle_enabled()?;

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "enabled": enabled }))
    } else {
        let label = if enabled { style("enabled").green() } else { style("disabled").yellow() };
        println!("Screensaver {label}");
        Ok(())
    }
}

async fn cmd_idle(cli: &Cli, args: &cli::IdleArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    let report = bg.on_idle_state(args.state).await?;

    if cli.use_json() {
        return output_json(cli, &serde_json::json!({ "state": args.state, "placement": report }));
    }
    match report {
        Some(report) => print_placement(&report),
        None => println!("No windows opened"),
    }
    Ok(())
}

async fn cmd_show(cli: &Cli, args: &cli::ShowArgs) -> Result<()> {
    let bg = open_engine(cli)?;
    let report = bg.placer().display_screensaver(args.single).await?;

    if cli.use_json() {
        output_json(cli, &report)
    } else {
        print_placement(&report);
        Ok(())
    }
}

fn print_placement(report: &PlacementReport) {
    if report.placements.is_empty() {
        println!("No displays to place windows on");
    }
    for placement in &report.placements {
        match placement {
            Placement::Opened { display, window, phase } => println!(
                "{} {}: window {window} ({phase:?})",
                style("✓").green(),
                display.as_deref().unwrap_or("default")
            ),
            Placement::Skipped { display } => println!(
                "{} {}: full-screen window present, skipped",
                style("-").yellow(),
                display.as_deref().unwrap_or("default")
            ),
            Placement::Failed { display, reason } => println!(
                "{} {}: {reason}",
                style("✗").red(),
                display.as_deref().unwrap_or("default")
            ),
        }
    }
}

fn cmd_close(cli: &Cli) -> Result<()> {
    let bg = open_engine(cli)?;
    bg.placer().close_all();

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "close_requested": true }))
    } else {
        println!("Close requested");
        Ok(())
    }
}

#[derive(Serialize)]
struct SourceStatus {
    key: &'static str,
    enabled: bool,
    cached: usize,
}

#[derive(Serialize)]
struct Status {
    version: Option<i64>,
    enabled: bool,
    keep_awake: bool,
    active_window: ActiveWindow,
    active_now: bool,
    badge: &'static str,
    idle_seconds: u32,
    showing: bool,
    sources: Vec<SourceStatus>,
}

async fn cmd_status(cli: &Cli) -> Result<()> {
    use pss::config::defaults::key;

    let bg = open_engine(cli)?;
    let settings = bg.settings();
    let now = chrono::Local::now().time();

    let mut sources = Vec::new();
    for source in PhotoSourceKey::ALL {
        let cached = bg
            .dispatcher()
            .sources()
            .cache()
            .read(source.as_str())?
            .map_or(0, |p| p.len());
        sources.push(SourceStatus {
            key: source.as_str(),
            enabled: settings.get_bool(source.as_str())?,
            cached,
        });
    }

    let status = Status {
        version: settings.get_int(key::VERSION)?,
        enabled: settings.get_bool(key::ENABLED)?,
        keep_awake: settings.get_bool(key::KEEP_AWAKE)?,
        active_window: ActiveWindow::from_settings(settings)?,
        active_now: schedule::is_active(settings, now)?,
        badge: schedule::badge_text(settings, now)?,
        idle_seconds: settings.idle_seconds()?,
        showing: bg.placer().is_showing().await,
        sources,
    };

    if cli.use_json() {
        return output_json(cli, &status);
    }

    let yes_no = |b: bool| if b { style("yes").green() } else { style("no").dim() };
    println!("{}", style("SCREENSAVER").bold().underlined());
    let version = status
        .version
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    println!("  version:      {version}");
    println!("  enabled:      {}", yes_no(status.enabled));
    println!("  keep awake:   {}", yes_no(status.keep_awake));
    println!(
        "  active:       {} - {} ({})",
        status.active_window.start.format("%H:%M"),
        status.active_window.stop.format("%H:%M"),
        if status.active_now { "now active" } else { "now inactive" }
    );
    println!("  idle after:   {}s", status.idle_seconds);
    println!("  badge:        {:?}", status.badge);
    println!();
    println!("{}", style("PHOTO SOURCES").bold().underlined());
    for s in &status.sources {
        println!("  {:<22} {:<4} {} cached", s.key, yes_no(s.enabled), s.cached);
    }
    Ok(())
}

async fn cmd_fetch(cli: &Cli, args: &cli::FetchArgs) -> Result<()> {
    Px500::check_gallery(&args.gallery)?;
    let px = Px500::new(
        Arc::new(ReqwestClient::new()?),
        args.consumer_key.clone().unwrap_or_default(),
    );
    let mut photos = px.load_images(&args.gallery).await?;
    if args.limit > 0 {
        photos.truncate(args.limit);
    }

    if cli.use_json() {
        return output_json(cli, &photos);
    }
    for p in &photos {
        println!("{:>5}  {:<24}  {}", pss::photos::format_significant(p.asp, 3), p.author, p.url);
    }
    println!("{} photos from {}", style(photos.len()).bold(), args.gallery);
    Ok(())
}

// === Utilities ===

fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        return output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    }

    println!("pss {}", build_info::VERSION);
    println!(
        "git: {}{}",
        build_info::git_sha(),
        if build_info::git_dirty() == "true" { " (dirty)" } else { "" }
    );
    println!("built: {}", build_info::build_timestamp());
    println!("rustc: {}", build_info::rustc_semver());
    println!("target: {}", build_info::target());
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "pss", &mut io::stdout());
    Ok(())
}

fn output_json<T: Serialize + ?Sized>(cli: &Cli, data: &T) -> Result<()> {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    println!("{json}");
    Ok(())
}

fn output_error(cli: &Cli, error: &PssError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{json}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
