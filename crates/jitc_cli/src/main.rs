//! jitc CLI: inspect and maintain a JIT object cache from the shell.
//!
//! Provides `jitc shard` to locate the directory for a module CRC,
//! `jitc inspect` to decode a header file, `jitc get` / `jitc put` to run a
//! lookup or a store for a serialized module, and `jitc audit` to check a
//! whole cache directory.

#![warn(missing_docs)]

mod audit;
mod entry;
mod inspect;
mod settings;
mod shard;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jitc_common::OptLevel;
use jitc_diagnostics::{
    Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer,
};

/// jitc: a disk cache for JIT-compiled object code.
#[derive(Parser, Debug)]
#[command(name = "jitc", version, about = "JIT object cache tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `jitc.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Cache root directory, overriding configuration and environment.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the shard directory for a module CRC.
    Shard(ShardArgs),
    /// Decode and check a cache header file.
    Inspect(InspectArgs),
    /// Look up the cached object for a serialized module.
    Get(GetArgs),
    /// Store an object for a serialized module.
    Put(PutArgs),
    /// Classify every entry in the cache directory.
    Audit(AuditArgs),
}

/// Arguments for the `jitc shard` subcommand.
#[derive(Parser, Debug)]
pub struct ShardArgs {
    /// Module CRC in hexadecimal (e.g. `1a2b3c4d` or `0x1a2b3c4d`).
    pub crc: String,
}

/// Arguments for the `jitc inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to the header file (the entry file without `.obj`).
    pub header: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Target options folded into the cache key.
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Target CPU name, overriding the configuration.
    #[arg(long)]
    pub cpu: Option<String>,

    /// Optimization level (`none`, `less`, `default`, `aggressive` or `0`-`3`).
    #[arg(long)]
    pub opt: Option<OptLevel>,
}

/// Arguments for the `jitc get` subcommand.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// File holding the serialized module.
    pub module: PathBuf,

    /// Module id (default: the module file's stem).
    #[arg(long)]
    pub id: Option<String>,

    /// Write the cached object here on a hit.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Key options.
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for the `jitc put` subcommand.
#[derive(Parser, Debug)]
pub struct PutArgs {
    /// File holding the serialized module.
    pub module: PathBuf,

    /// File holding the compiled object.
    pub object: PathBuf,

    /// Module id (default: the module file's stem).
    #[arg(long)]
    pub id: Option<String>,

    /// Key options.
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for the `jitc audit` subcommand.
#[derive(Parser, Debug)]
pub struct AuditArgs {
    /// Output format for the report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
    /// Optional cache root override.
    pub root: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        root: cli.root,
    };
    setup_logging(&global);

    let result = match cli.command {
        Command::Shard(ref args) => shard::run(args, &global),
        Command::Inspect(ref args) => inspect::run(args, &global),
        Command::Get(ref args) => entry::get(args, &global),
        Command::Put(ref args) => entry::put(args, &global),
        Command::Audit(ref args) => audit::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the tracing subscriber that prints cache events to stderr.
///
/// `RUST_LOG` takes precedence over the `--quiet` / `--verbose` defaults.
fn setup_logging(global: &GlobalArgs) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_level(global)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Prints collected diagnostics to stderr.
///
/// In quiet mode only errors are shown.
pub(crate) fn render_diagnostics(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    global: &GlobalArgs,
) {
    let visible = diagnostics
        .iter()
        .filter(|d| !global.quiet || d.severity == Severity::Error);
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in visible {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            for diag in visible {
                eprintln!("{}", JsonRenderer.render(diag));
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_global(root: &std::path::Path) -> GlobalArgs {
    GlobalArgs {
        quiet: true,
        verbose: false,
        color: false,
        config: None,
        root: Some(root.to_path_buf()),
    }
}
