//! Ledger Pipeline CLI
//!
//! Address derivation and failure diagnostics from the command line:
//!
//! - `derive`: program-derived address for arbitrary typed seeds
//! - `ata`, `metadata`, `todo-address`: well-known derivations
//! - `reserve`: rent-exempt minimum from the configured RPC endpoint
//! - `correlate`: recover a transaction signature from an error message
//! - `explorer-url`, `pubkey`: helpers for the configured cluster and wallet

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_pipeline::address::{well_known, Seeds};
use ledger_pipeline::config::Config;
use ledger_pipeline::correlate::{self, explorer_url, ExplorerTarget, FailureCorrelator};
use ledger_pipeline::metrics::metrics;
use ledger_pipeline::rpc::{
    FailureKind, JsonRpcBoundary, NetworkBoundary, RawBoundaryError, StructuredFailure,
};
use ledger_pipeline::types::{AccountLocator, CorrelationId, DerivedAddress};
use ledger_pipeline::wallet::Keypair;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print collected metrics on exit
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive a program address from typed seeds
    ///
    /// Seeds are `str:<text>`, `key:<base58>`, `u8:<0-255>` or `hex:<bytes>`,
    /// used in the order given.
    Derive {
        #[arg(long)]
        program: AccountLocator,
        #[arg(long = "seed")]
        seeds: Vec<String>,
    },

    /// Associated token account of a wallet for a mint
    Ata {
        #[arg(long)]
        wallet: AccountLocator,
        #[arg(long)]
        mint: AccountLocator,
        /// Use the Token-2022 program instead of the classic token program
        #[arg(long)]
        token_2022: bool,
    },

    /// Metadata (and optionally master edition) account of a mint
    Metadata {
        #[arg(long)]
        mint: AccountLocator,
        #[arg(long)]
        edition: bool,
    },

    /// Todo profile account of an owner, or one of its todo items
    TodoAddress {
        /// Defaults to the configured wallet
        #[arg(long)]
        owner: Option<AccountLocator>,
        #[arg(long)]
        index: Option<u8>,
    },

    /// Rent-exempt minimum for an account of the given size
    Reserve {
        #[arg(long)]
        bytes: usize,
    },

    /// Recover a transaction signature from a failure message
    Correlate {
        message: String,
        /// Look up the transaction's logs on the configured endpoint
        #[arg(long)]
        fetch_logs: bool,
    },

    /// Explorer link for a transaction signature or an address
    ExplorerUrl {
        #[arg(long, conflicts_with = "address", required_unless_present = "address")]
        tx: Option<String>,
        #[arg(long)]
        address: Option<AccountLocator>,
    },

    /// Public key of the configured wallet
    Pubkey,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs)?;

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    debug!(rpc = %config.rpc.url, cluster = %config.explorer.cluster, "Configuration loaded");

    run(args.command, &config).await?;

    if args.print_metrics {
        print!("{}", metrics().export_text()?);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Derive { program, seeds } => {
            let seeds = parse_seeds(&seeds)?;
            print_derived(&seeds.derive(&program)?);
        }
        Command::Ata {
            wallet,
            mint,
            token_2022,
        } => {
            let token_program = if token_2022 {
                well_known::TOKEN_2022_PROGRAM_ID
            } else {
                well_known::TOKEN_PROGRAM_ID
            };
            print_derived(&well_known::associated_token_address(&wallet, &mint, &token_program)?);
        }
        Command::Metadata { mint, edition } => {
            let derived = if edition {
                well_known::master_edition_address(&mint)?
            } else {
                well_known::metadata_address(&mint)?
            };
            print_derived(&derived);
        }
        Command::TodoAddress { owner, index } => {
            let owner = match owner {
                Some(owner) => owner,
                None => load_wallet(config)?.locator(),
            };
            let program = config.todo_program()?;
            let profile = well_known::todo_profile_address(&program, &owner)?;
            match index {
                Some(index) => {
                    print_derived(&well_known::todo_item_address(&program, &profile.locator(), index)?)
                }
                None => print_derived(&profile),
            }
        }
        Command::Reserve { bytes } => {
            let boundary = JsonRpcBoundary::from_config(&config.rpc)?;
            let lamports = boundary.get_minimum_reserve(bytes).await?;
            println!("{}", lamports);
        }
        Command::Correlate {
            message,
            fetch_logs,
        } => correlate_message(config, message, fetch_logs).await?,
        Command::ExplorerUrl { tx, address } => {
            let target = match (tx, address) {
                (Some(tx), _) => ExplorerTarget::Transaction(CorrelationId::new(tx)),
                (None, Some(address)) => ExplorerTarget::Address(address),
                (None, None) => bail!("either --tx or --address is required"),
            };
            println!("{}", explorer_url(&target, &config.explorer.cluster));
        }
        Command::Pubkey => {
            let wallet = load_wallet(config)?;
            println!("{}", wallet.locator());
        }
    }
    Ok(())
}

async fn correlate_message(config: &Config, message: String, fetch_logs: bool) -> Result<()> {
    let raw = RawBoundaryError::from_message(message);
    if !fetch_logs {
        match correlate::correlate(&raw) {
            Some(id) => {
                println!("{}", id);
                println!(
                    "{}",
                    explorer_url(&ExplorerTarget::Transaction(id), &config.explorer.cluster)
                );
            }
            None => warn!("No transaction signature found in message"),
        }
        return Ok(());
    }

    let boundary = JsonRpcBoundary::from_config(&config.rpc)?;
    let correlator = FailureCorrelator::new(Arc::new(boundary))
        .with_cluster(config.explorer.cluster.clone());
    let diagnosis = correlator
        .diagnose(&StructuredFailure::new(FailureKind::Rejection, raw))
        .await;
    println!("{}", diagnosis);
    Ok(())
}

fn print_derived(derived: &DerivedAddress) {
    println!("{} (bump {})", derived.locator(), derived.bump());
}

fn load_wallet(config: &Config) -> Result<Keypair> {
    let path = config.keypair_path();
    info!("🔑 Loading wallet from: {}", path.display());
    Keypair::from_file(&path).with_context(|| format!("Failed to load wallet {}", path.display()))
}

/// `str:profile`, `key:<base58>`, `u8:3`, `hex:00ff`
fn parse_seeds(args: &[String]) -> Result<Seeds> {
    let mut seeds = Seeds::new();
    for arg in args {
        let (kind, value) = arg
            .split_once(':')
            .with_context(|| format!("Seed '{}' must look like <kind>:<value>", arg))?;
        seeds = match kind {
            "str" => seeds.bytes(value.as_bytes())?,
            "key" => seeds.locator(&value.parse::<AccountLocator>()?)?,
            "u8" => seeds.index(
                value
                    .parse::<u8>()
                    .with_context(|| format!("'{}' is not a one-byte index", value))?,
            )?,
            "hex" => seeds.bytes(&hex::decode(value).context("Invalid hex seed")?)?,
            other => bail!("Unknown seed kind '{}'", other),
        };
    }
    if seeds.is_empty() {
        warn!("Deriving with no seeds");
    }
    debug!(count = seeds.len(), "Parsed seeds");
    Ok(seeds)
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "ledger_pipeline=debug,info"
    } else {
        "ledger_pipeline=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
