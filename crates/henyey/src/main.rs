//! henyey - ledger ingestion and transaction lookup
//!
//! Replays closed ledgers from a JSON file, derives sponsorship state,
//! operations and effects, and materializes transactions by hash.
//!
//! # Quick Start
//!
//! ```bash
//! # Replay ledgers and write every derived resource as JSON
//! henyey --testnet ingest ledgers.json --output out.json
//!
//! # Look a transaction up by its inner or outer hash
//! henyey --testnet tx 3389e9f0... ledgers.json
//!
//! # Print a sample configuration
//! henyey sample-config
//! ```
//!
//! # Configuration
//!
//! Configuration can be provided via:
//! - A TOML configuration file (`--config <FILE>`)
//! - Built-in network defaults (`--testnet` or `--mainnet`)

mod logging;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use henyey_common::{Config, LogFormat};
use henyey_ingest::{
    parse_ledgers, AccountReserveState, Effect, LedgerOutput, LedgerProcessor, LedgerState,
    OperationRecord,
};
use henyey_tx::{materialize, TransactionResource};

use logging::LogConfig;

/// Ledger ingestion and transaction lookup
#[derive(Parser)]
#[command(name = "henyey")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (overrides the config file)
    #[arg(long, global = true)]
    log_format: Option<CliLogFormat>,

    /// Use testnet configuration (default)
    #[arg(long, global = true)]
    testnet: bool,

    /// Use mainnet configuration
    #[arg(long, global = true, conflicts_with = "testnet")]
    mainnet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Log output format for CLI
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliLogFormat {
    Text,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(fmt: CliLogFormat) -> Self {
        match fmt {
            CliLogFormat::Text => LogFormat::Text,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Replay ledgers and write transactions, operations, effects and accounts
    Ingest {
        /// JSON file with the ledgers to replay, in order
        #[arg(value_name = "LEDGERS")]
        ledgers: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replay ledgers and print one transaction by inner or outer hash
    Tx {
        /// Transaction hash (hex)
        #[arg(value_name = "HASH")]
        hash: String,

        /// JSON file with the ledgers to replay, in order
        #[arg(value_name = "LEDGERS")]
        ledgers: PathBuf,
    },

    /// Print sample configuration
    SampleConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&cli, &config)?;

    match &cli.command {
        Commands::Ingest { ledgers, output } => cmd_ingest(&config, ledgers, output.as_deref()),
        Commands::Tx { hash, ledgers } => cmd_tx(&config, hash, ledgers),
        Commands::SampleConfig => cmd_sample_config(),
    }
}

/// Initialize the logging subsystem.
fn init_logging(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let mut log_config = LogConfig::from_config(&config.logging);
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format.into());
    }

    logging::init(&log_config)?;

    tracing::debug!("Logging initialized");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::testnet(),
    };
    if cli.mainnet {
        config.network = Config::mainnet().network;
    } else if cli.testnet {
        config.network = Config::testnet().network;
    }
    Ok(config)
}

/// Replays a ledger file from an empty state.
fn replay(config: &Config, path: &Path) -> anyhow::Result<(LedgerState, LedgerOutput)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ledgers = parse_ledgers(&json)?;
    tracing::info!(
        path = %path.display(),
        ledgers = ledgers.len(),
        passphrase = %config.network.passphrase,
        "Replaying ledgers"
    );

    let processor = LedgerProcessor::from_config(config);
    let (state, output) = processor.process_all(&LedgerState::new(), &ledgers)?;
    Ok((state, output))
}

/// Sponsorship counters of one account as clients see them.
#[derive(Debug, Serialize)]
struct AccountResource {
    account_id: String,
    #[serde(flatten)]
    reserves: AccountReserveState,
}

#[derive(Debug, Serialize)]
struct IngestReport<'a> {
    transactions: Vec<TransactionResource>,
    operations: &'a [OperationRecord],
    effects: &'a [Effect],
    accounts: Vec<AccountResource>,
}

/// Ingest command handler.
fn cmd_ingest(config: &Config, ledgers: &Path, output_path: Option<&Path>) -> anyhow::Result<()> {
    let (state, output) = replay(config, ledgers)?;

    let transactions = output
        .transactions
        .iter()
        .map(|record| materialize(&record.transaction_hash, record))
        .collect::<Result<Vec<_>, _>>()?;
    let accounts = state
        .accounts_by_address()
        .into_iter()
        .map(|(account_id, reserves)| AccountResource {
            account_id,
            reserves,
        })
        .collect();
    let report = IngestReport {
        transactions,
        operations: &output.operations,
        effects: &output.effects,
        accounts,
    };

    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_json(BufWriter::new(file), &report)?;
            tracing::info!(path = %path.display(), "Wrote ingestion output");
        }
        None => write_json(io::stdout().lock(), &report)?,
    }
    Ok(())
}

/// Transaction lookup command handler.
fn cmd_tx(config: &Config, hash: &str, ledgers: &Path) -> anyhow::Result<()> {
    let (_, output) = replay(config, ledgers)?;
    let record = output
        .find_transaction(hash)
        .ok_or_else(|| anyhow::anyhow!("transaction {} not found", hash))?;
    let resource = materialize(hash, record)?;
    write_json(io::stdout().lock(), &resource)
}

fn cmd_sample_config() -> anyhow::Result<()> {
    println!("{}", toml::to_string_pretty(&Config::testnet())?);
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
