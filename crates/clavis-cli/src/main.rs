#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clavis_core::config::resolve_config;
use clavis_core::error::ErrorCode;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "clv",
    author,
    version,
    about = "clavis: lossless merging for identification keys",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Project config file (defaults to .clavis/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Merge(cmd::merge::MergeArgs),
    Sanitize(cmd::sanitize::SanitizeArgs),
    Check(cmd::check::CheckArgs),
    Match(cmd::match_cmd::MatchArgs),
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CLAVIS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "clavis=debug,info"
        } else {
            "clavis=info,warn"
        })
    });

    let format = env::var("CLAVIS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr; stdout is reserved for projects and reports.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(ref args) = cli.command {
        let mut command = Cli::command();
        cmd::completions::run_completions(args, &mut command, &mut std::io::stdout().lock());
        return Ok(());
    }

    let project_root = env::current_dir()?;
    let effective = match resolve_config(&project_root, cli.config.as_deref(), cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            return Err(cmd::fail(
                output::fallback(cli.json),
                ErrorCode::ConfigParseError,
                format!("{err:#}"),
            ));
        }
    };
    let output = OutputMode::from_name(&effective.resolved_output);
    let policy = effective.project.merge_policy();
    debug!(
        output = %effective.resolved_output,
        placeholder_domains = policy.placeholder_domains.len(),
        description_min_len = policy.description_min_len,
        "resolved configuration"
    );

    match cli.command {
        Commands::Merge(ref args) => cmd::merge::run_merge(args, output, &policy),
        Commands::Sanitize(ref args) => cmd::sanitize::run_sanitize(args, output),
        Commands::Check(ref args) => cmd::check::run_check(args, output),
        Commands::Match(ref args) => cmd::match_cmd::run_match(args, output),
        Commands::Completions(_) => Ok(()),
    }
}
