//! Herd ledger CLI
//!
//! Runs ledger operations against a catalog store on the local filesystem.
//! Each invocation opens the store, holding its directory lock, runs one
//! operation and exits.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use herd_ledger::{CatalogStateManager, Dispatcher};
use herd_store::{FilesystemStorageHandler, OsRandomHandler};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "herd")]
#[command(about = "Herd - livestock insurance ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "herd.toml")]
    config: PathBuf,

    /// Store directory, overriding the config file
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed empty catalogs, discarding any existing state
    Init {
        /// Seed value recorded with the initialization
        seed: String,
    },

    /// Invoke a ledger operation, e.g. `invoke registerOwner Jane Doe`
    Invoke {
        /// Operation name
        operation: String,

        /// Positional operation arguments
        args: Vec<String>,
    },

    /// Check cross-catalog invariants and print the report
    Verify,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let storage = FilesystemStorageHandler::open(&config.store.data_dir)
        .await
        .with_context(|| {
            format!("Failed to open store at {}", config.store.data_dir.display())
        })?;
    debug!(data_dir = %config.store.data_dir.display(), "Store opened");
    let manager = CatalogStateManager::new(storage, OsRandomHandler::new(), &config.ledger);
    let dispatcher = Dispatcher::new(Arc::new(manager));

    match cli.command {
        Commands::Init { seed } => {
            run(&dispatcher, "init", vec![seed]).await?;
            println!("Initialized ledger at {}", config.store.data_dir.display());
        }

        Commands::Invoke { operation, args } => {
            let response = run(&dispatcher, &operation, args).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&response)?;
            writeln!(stdout)?;
        }

        Commands::Verify => {
            let report = dispatcher
                .manager()
                .check_consistency()
                .await
                .context("Failed to check catalogs")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.consistent {
                bail!(
                    "{} invariant violation(s) found",
                    report.violations.len()
                );
            }
        }
    }

    Ok(())
}

async fn run(
    dispatcher: &Dispatcher<FilesystemStorageHandler, OsRandomHandler>,
    operation: &str,
    args: Vec<String>,
) -> Result<Vec<u8>> {
    match dispatcher.dispatch(operation, &args).await {
        Ok(response) => Ok(response),
        Err(err) => {
            eprintln!("{}", String::from_utf8_lossy(&err.payload));
            Err(anyhow::Error::new(err).context(format!("{operation} failed")))
        }
    }
}
