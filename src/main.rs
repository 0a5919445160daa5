//! FHE Vault - command-line client for a confidential savings vault
//!
//! # WARNING
//! - Every write attaches value (0.01 ETH by default). Check the network first.
//! - Encryption is a placeholder: payloads sent today are empty.
//! - A submitted transaction is not a confirmed one. Run `status` afterwards.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

// Use the library crate
use fhe_vault::cli::commands::{self, SessionArgs};
use fhe_vault::config::Config;
use fhe_vault::types::Currency;

/// FHE Vault - confidential savings vault client
#[derive(Parser)]
#[command(name = "vault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "vault.toml")]
    config: String,

    /// Wallet connector: rpc or address
    #[arg(long, global = true)]
    connector: Option<String>,

    /// Address used by the `address` connector
    #[arg(long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the vault for the connected wallet
    Status {
        /// Show balance and interest instead of the mask
        #[arg(long)]
        reveal: bool,
    },

    /// Create a vault (starts locked)
    Create {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Deposit into the vault
    Deposit {
        /// Amount to deposit, e.g. "250.5"
        amount: String,

        /// Currency: USDC, USDT or DAI
        #[arg(long, default_value = "USDC")]
        currency: Currency,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Toggle the vault lock
    Lock {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List wallet connectors
    Connectors,

    /// Connect and disconnect the wallet session
    Disconnect,

    /// Show current configuration (secrets masked)
    Config,

    /// Check system health (RPC, contract, wallet)
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fhe_vault=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if config.contract.contract_address().is_none() {
        info!("No vault contract configured; only status checks will be useful");
    }

    let session = SessionArgs {
        connector: cli.connector,
        address: cli.address,
    };

    // Execute command
    let result = match cli.command {
        Commands::Status { reveal } => commands::status(&config, &session, reveal).await,
        Commands::Create { force } => commands::create(&config, &session, force).await,
        Commands::Deposit {
            amount,
            currency,
            force,
        } => commands::deposit(&config, &session, &amount, currency, force).await,
        Commands::Lock { force } => commands::lock(&config, &session, force).await,
        Commands::Connectors => commands::connectors(&config, &session).await,
        Commands::Disconnect => commands::disconnect(&config, &session).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config, &session).await,
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
