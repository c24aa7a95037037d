// Copyright 2026 Batchwise Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use batchwise::cli;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "batchwise",
    about = "Batchwise — per-batch statistics and sensor-difference reports for bioprocess runs",
    version,
    after_help = "Run 'batchwise <command> --help' for details on each command."
)]
struct Cli {
    /// Path to the batch store database (default: ~/.batchwise/batchwise.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a tab-delimited data directory into the store
    Ingest {
        /// Directory containing sensor files and batch metadata
        data_dir: PathBuf,
    },
    /// Write the wide per-batch aggregate table as CSV
    Table {
        /// Output directory
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Write one sensor-difference chart per eligible batch
    Charts {
        /// Output directory
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Print the paired-sensor difference series for one batch
    Diff {
        /// Batch id to compare sensors for
        batch_id: String,
        /// Sensor family (temp, ph)
        family: String,
    },
    /// List eligible batch ids
    Batches,
    /// Show store location and row counts
    Status,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("BATCHWISE_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("BATCHWISE_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("BATCHWISE_VERBOSE", "1");
    }

    let default_directive = if cli.verbose {
        "batchwise=debug"
    } else {
        "batchwise=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let db = cli.db.clone().unwrap_or_else(cli::default_db_path);

    let result = match cli.command {
        Commands::Ingest { data_dir } => cli::ingest_cmd::run(&db, &data_dir).await,
        Commands::Table { out } => cli::table_cmd::run(&db, &out).await,
        Commands::Charts { out } => cli::charts_cmd::run(&db, &out).await,
        Commands::Diff { batch_id, family } => cli::diff_cmd::run(&db, &batch_id, &family).await,
        Commands::Batches => cli::batches_cmd::run(&db).await,
        Commands::Status => cli::status::run(&db).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "batchwise", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
