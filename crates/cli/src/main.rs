//! dotsync command-line tool.
//!
//! Drives sync passes between deployed configuration files and the
//! template repository they were installed from, and provides read-only
//! inspection (`status`), an environment health check (`doctor`), and
//! config generation (`init`).

mod commands;
mod signals;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dotsync_core::session::{SyncMode, SyncOptions};
use dotsync_core::Config;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// dotsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "dotsync",
    version,
    about = "Synchronize deployed configuration files back into their template repository"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "~/.config/dotsync/dotsync.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a sync pass (three-way merge by default).
    Sync {
        /// Replace repository copies without attempting a merge.
        #[arg(long)]
        overwrite: bool,

        /// Compute and report without touching any file.
        #[arg(long)]
        dry_run: bool,

        /// Never prompt; fail fast when a required tool is missing.
        #[arg(long)]
        non_interactive: bool,

        /// Report per-candidate classification and comparison results.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report drift between deployed files and the repository (read-only).
    Status,

    /// Check external tools and configuration health.
    Doctor,

    /// Generate a default configuration file.
    Init {
        /// Template repository root to record in the config.
        repo_root: PathBuf,

        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./dotsync.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = expand_tilde(&cli.config);

    match cli.command {
        Commands::Init { repo_root, output } => {
            commands::init::run(&repo_root, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Doctor => {
            commands::doctor::run(&config_path).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let config = load_config(&config_path)?;
            init_logging(&config.options.log_level);
            commands::status::run(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync {
            overwrite,
            dry_run,
            non_interactive,
            verbose,
        } => {
            let config = load_config(&config_path)?;
            init_logging(&config.options.log_level);
            let options = SyncOptions {
                mode: if overwrite {
                    SyncMode::Overwrite
                } else {
                    SyncMode::Merge
                },
                dry_run,
                verbose,
            };
            commands::sync::run(config, options, non_interactive).await
        }
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    Config::load(path).with_context(|| format!("loading configuration from {}", path.display()))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
