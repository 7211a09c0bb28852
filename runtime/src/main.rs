// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lms_scraper::cli;
use lms_scraper::cli::scrape_cmd::ScrapeArgs;
use lms_scraper::config::load_env_file;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lms-scraper",
    about = "Collect module materials from the university LMS into ./data",
    version,
    after_help = "Run 'lms-scraper <command> --help' for details on each command.\nRun 'lms-scraper' with no command to scrape."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes priority
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Load secrets from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, collect every module's materials, then format the output
    Scrape(ScrapeArgs),
    /// Check environment and diagnose issues
    Doctor {
        /// Output directory to check
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match load_env_file(cli.env_file.as_deref()) {
        Err(e) => Err(e.into()),
        Ok(loaded) => {
            if let Some(path) = loaded {
                tracing::debug!("loaded environment from {}", path.display());
            }
            match cli.command {
                None => cli::scrape_cmd::run(&ScrapeArgs::default()).await,
                Some(Commands::Scrape(args)) => cli::scrape_cmd::run(&args).await,
                Some(Commands::Doctor { data_dir }) => cli::doctor::run(data_dir.as_deref()).await,
                Some(Commands::Completions { shell }) => {
                    let mut cmd = Cli::command();
                    clap_complete::generate(shell, &mut cmd, "lms-scraper", &mut std::io::stdout());
                    Ok(())
                }
            }
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
