//! # Chain Indexer
//!
//! Entry point: load configuration, install telemetry, then either run the
//! indexer until Ctrl-C or answer a one-off query.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indexer_runtime::{IndexerConfig, IndexerRuntime};
use indexer_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};
use ix_03_account_index::ValidatorFilter;
use ix_05_pending_transactions::{PendingFilter, PendingQuery, PendingSort};
use shared_types::{Address, ChainId, Pagination};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "chain-indexer", version, about = "Index a Lisk-style chain")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index blocks and mirror the pool until interrupted (default)
    Run {
        /// Print the Prometheus exposition on exit
        #[arg(long)]
        print_metrics: bool,
    },
    /// Resolve the channel between this chain and another
    Channel {
        #[arg(long)]
        chain_id: ChainId,
    },
    /// Query the node's pending transactions
    Pending {
        #[arg(long)]
        sender_address: Option<Address>,
        #[arg(long)]
        module_command: Option<String>,
        #[arg(long)]
        receiving_chain_id: Option<ChainId>,
        #[arg(long, default_value = "fee:desc")]
        sort: PendingSort,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = shared_types::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// List indexed validators
    Validators {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = shared_types::DEFAULT_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = IndexerConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    let mut runtime = IndexerRuntime::bootstrap(config).await?;

    match cli.command.unwrap_or(Command::Run {
        print_metrics: false,
    }) {
        Command::Run { print_metrics } => {
            runtime.start()?;
            let halted = tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    None
                }
                notice = runtime.wait_for_halt() => Some(notice),
            };
            runtime.shutdown().await;
            if print_metrics {
                println!("{}", gather_metrics()?);
            }
            if let Some(notice) = halted {
                bail!("{notice}");
            }
            info!("Indexer stopped");
        }
        Command::Channel { chain_id } => {
            let resolved = runtime.resolve_channel(&chain_id).await?;
            println!("route: {}", resolved.route.as_str());
            println!("{}", serde_json::to_string_pretty(&resolved.channel)?);
        }
        Command::Pending {
            sender_address,
            module_command,
            receiving_chain_id,
            sort,
            offset,
            limit,
        } => {
            let query = PendingQuery {
                filter: PendingFilter {
                    sender_address,
                    module_command,
                    receiving_chain_id,
                    ..PendingFilter::default()
                },
                sort,
                page: Pagination::new(offset, limit),
            };
            let page = runtime.query_pending(&query).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Validators {
            name,
            offset,
            limit,
        } => {
            let filter = ValidatorFilter {
                name,
                page: Pagination::new(offset, limit),
                ..ValidatorFilter::default()
            };
            let page = runtime.accounts().query_validators(&filter)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }
    Ok(())
}
