//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use msgview_core::discovery::DiscoverOptions;
use msgview_core::{BundleResult, ProgressReporter, SilentProgress};
use msgview_shared::{
    AppConfig, BundleConfig, MsgviewError, config_file_path, init_config, init_config_at,
    load_config, load_config_from, resolve_path,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// msgview — bundle conversation transcripts into one HTML viewer.
#[derive(Debug, Parser)]
#[command(
    name = "msgview",
    version,
    about = "Embed conversation transcripts into a self-contained HTML viewer.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Base directory for relative paths (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Directory containing the conversation .txt files.
    #[arg(long, global = true)]
    pub messages: Option<PathBuf>,

    /// Viewer template containing `window.IMESSAGE_DATA = {};`.
    #[arg(long, global = true)]
    pub template: Option<PathBuf>,

    /// Where to write the generated viewer.
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Config file to use instead of ~/.msgview/msgview.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Generate the viewer (default).
    Bundle,

    /// List the conversations that would be bundled.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Filter directive for a `-v` count.
///
/// Without `-v` only errors are logged: skipped files and a missing marker
/// already appear in the progress lines and summary.
pub(crate) fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "msgview_core=error,msgview_shared=error,msgview=error",
        1 => "msgview_core=info,msgview_shared=info,msgview=info",
        2 => "msgview_core=debug,msgview_shared=debug,msgview=debug",
        _ => "msgview_core=trace,msgview_shared=trace,msgview=trace",
    }
}

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Command::Bundle) => cmd_bundle(&cli),
        Some(Command::List) => cmd_list(&cli),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(&cli),
            ConfigAction::Show => cmd_config_show(&cli),
        },
    }
}

/// Load the config file named by `--config`, or the user config.
fn app_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge config file values with CLI flags; flags win.
pub(crate) fn bundle_config(cli: &Cli, app: &AppConfig) -> Result<BundleConfig> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    let mut config = BundleConfig::resolve(app, &root);
    if let Some(messages) = &cli.messages {
        config.messages_dir = resolve_path(&root, messages);
    }
    if let Some(template) = &cli.template {
        config.template = resolve_path(&root, template);
    }
    if let Some(output) = &cli.output {
        config.output = resolve_path(&root, output);
    }

    Ok(config)
}

fn cmd_bundle(cli: &Cli) -> Result<()> {
    let app = app_config(cli)?;
    let config = bundle_config(cli, &app)?;

    info!(
        messages = %config.messages_dir.display(),
        template = %config.template.display(),
        output = %config.output.display(),
        "bundling conversations"
    );

    let reporter = CliProgress::new();
    let result =
        msgview_core::run(&config, &reporter).wrap_err("failed to generate viewer")?;

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &BundleResult) {
    println!();
    for line in summary_lines(result) {
        println!("{line}");
    }
}

/// Summary printed after a bundle; an empty string is a blank line.
pub(crate) fn summary_lines(result: &BundleResult) -> Vec<String> {
    let file_name = result
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.output_path.display().to_string());

    let mut lines = vec![
        format!(
            "✓ Generated viewer with {} conversations",
            result.conversation_count
        ),
        format!("✓ Saved to: {}", result.output_path.display()),
    ];
    if result.skipped_count > 0 {
        lines.push(format!("! Skipped {} unreadable files", result.skipped_count));
    }
    if result.marker_count == 0 {
        lines.push(
            "! Template has no `window.IMESSAGE_DATA = {};` marker; no data was embedded".into(),
        );
    }
    lines.push(format!(
        "✓ Done in {:.2}s ({} bytes of transcripts)",
        result.elapsed.as_secs_f64(),
        result.total_bytes
    ));
    lines.push(String::new());
    lines.push(format!("Open {file_name} in your browser to view your messages!"));
    lines
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a bar on stderr, per-file lines on stdout.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    /// Print a line without tearing the progress bar.
    fn line(&self, text: String) {
        self.bar.suspend(|| println!("{text}"));
    }
}

impl ProgressReporter for CliProgress {
    fn discovered(&self, count: usize) {
        self.bar.set_length(count as u64);
        self.line(format!("Found {count} conversation files"));
    }

    fn loaded(&self, name: &str, bytes: usize) {
        self.bar.inc(1);
        self.bar.set_message(name.to_string());
        self.line(format!("Loaded: {name} ({bytes} bytes)"));
    }

    fn skipped(&self, name: &str, error: &MsgviewError) {
        self.bar.inc(1);
        self.line(format!("Error reading {name}: {error}"));
    }

    fn done(&self, _result: &BundleResult) {
        self.bar.finish_and_clear();
    }
}

// A fatal error returns before `done`; clear the bar before the report prints.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Other commands
// ---------------------------------------------------------------------------

fn cmd_list(cli: &Cli) -> Result<()> {
    let app = app_config(cli)?;
    let config = bundle_config(cli, &app)?;

    let scanned = msgview_core::scan(
        &config.messages_dir,
        &DiscoverOptions::from(&config),
        &SilentProgress,
    )?;

    println!("Messages: {}", config.messages_dir.display());
    for name in scanned.dataset.names() {
        let bytes = scanned.dataset.get(name).map_or(0, str::len);
        println!("  {name:<40} {bytes:>10} bytes");
    }
    for skipped in &scanned.skipped {
        println!("  {} (unreadable: {})", skipped.path.display(), skipped.error);
    }
    println!(
        "{} conversations, {} bytes",
        scanned.dataset.len(),
        scanned.dataset.total_bytes()
    );

    Ok(())
}

fn cmd_config_init(cli: &Cli) -> Result<()> {
    let path = match &cli.config {
        Some(path) => {
            init_config_at(path)?;
            path.clone()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let app = app_config(cli)?;
    let source = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let toml_str = toml::to_string_pretty(&app)?;
    println!("# {}", describe_source(&source));
    println!("{toml_str}");

    let config = bundle_config(cli, &app)?;
    println!("# resolved");
    println!("# messages = {}", config.messages_dir.display());
    println!("# template = {}", config.template.display());
    println!("# output   = {}", config.output.display());
    Ok(())
}

fn describe_source(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, showing defaults)", path.display())
    }
}
