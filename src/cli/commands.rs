//! CLI command implementations

use anyhow::{Context, Result};
use dialoguer::Confirm;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cipher::PlaceholderCipher;
use crate::config::Config;
use crate::gateway::{ContractGateway, JsonRpcClient, JsonRpcGateway};
use crate::types::{ActionOutcome, Address, Currency};
use crate::vault::{Notification, VaultController, VaultStatus, VaultView};
use crate::wallet::{NodeWallet, WalletProvider};

type Controller = VaultController<JsonRpcGateway, PlaceholderCipher>;

/// Wallet selection shared by every command
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    /// Connector id; falls back to `wallet.default_connector`
    pub connector: Option<String>,
    /// Address for the `address` connector; falls back to `wallet.address`
    pub address: Option<String>,
}

impl SessionArgs {
    fn connector<'a>(&'a self, config: &'a Config) -> &'a str {
        self.connector
            .as_deref()
            .unwrap_or(&config.wallet.default_connector)
    }

    fn watch_address(&self, config: &Config) -> Result<Option<Address>> {
        self.address
            .as_deref()
            .or(config.wallet.address.as_deref())
            .map(|a| a.parse::<Address>().context("Invalid wallet address"))
            .transpose()
    }
}

/// A connected controller plus the receiving end of its notifications
struct Client {
    controller: Controller,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Client {
    /// Print every notification produced so far
    fn flush(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            if notification.is_error() {
                println!("[!] {}", notification);
            } else {
                println!("[+] {}", notification);
            }
        }
    }
}

fn build_controller(config: &Config, session: &SessionArgs) -> Result<Client> {
    let rpc = Arc::new(JsonRpcClient::from_config(&config.rpc)?);
    let gateway = Arc::new(JsonRpcGateway::new(
        rpc.clone(),
        config.contract.contract_address(),
        config.transaction.clone(),
    ));
    let wallet: Arc<dyn WalletProvider> =
        Arc::new(NodeWallet::new(rpc, session.watch_address(config)?));
    let cipher = Arc::new(PlaceholderCipher::from_config(&config.display));

    let (tx, rx) = mpsc::unbounded_channel();
    let controller = VaultController::new(gateway, cipher, wallet)
        .with_notifier(tx)
        .with_apy(config.display.apy_pct);

    Ok(Client {
        controller,
        notifications: rx,
    })
}

async fn connect(config: &Config, session: &SessionArgs) -> Result<Client> {
    let client = build_controller(config, session)?;
    let connector = session.connector(config);

    info!("Connecting wallet via '{}'...", connector);
    let connected = client
        .controller
        .connect(connector)
        .await
        .with_context(|| format!("Wallet connection via '{}' failed", connector))?;

    if let Some(address) = connected.address {
        info!("Connected as {}", address);
    }
    Ok(client)
}

fn confirm(prompt: String, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !confirmed {
        info!("Cancelled by user");
    }
    Ok(confirmed)
}

fn print_view(view: &VaultView) {
    println!("\n=== VAULT STATUS ===\n");

    match view.address {
        Some(address) => println!("Wallet: {} ({})", address.short(), address),
        None => println!("Wallet: not connected"),
    }
    println!("Vault: {}", view.status);

    if view.status == VaultStatus::NotFound {
        println!("\nNo vault yet. Run `vault create` to open one.");
        return;
    }

    println!("\nEncrypted Balance: {}", view.balance);
    println!("Interest Earned:   {}", view.accrued_interest);
    println!("APY:               {}%", view.apy_pct);

    if let Some(locked) = view.is_locked {
        println!(
            "\nLock: {}",
            if locked {
                "LOCKED (deposits disabled)"
            } else {
                "UNLOCKED"
            }
        );
    }
}

fn print_outcome(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Submitted(receipt) => {
            println!("Transaction: {}", receipt.tx_hash);
            println!("Submitted:   {}", receipt.submitted_at.to_rfc3339());
        }
        ActionOutcome::Skipped => println!("Already in progress, nothing sent."),
    }
}

/// Show the connected vault
pub async fn status(config: &Config, session: &SessionArgs, reveal: bool) -> Result<()> {
    let mut client = connect(config, session).await?;

    // connect() only logs a failed read; surface it here
    if client.controller.status().await == VaultStatus::Unknown {
        client.controller.refresh().await?;
    }

    let view = client
        .controller
        .view(reveal || config.display.reveal)
        .await;
    print_view(&view);
    client.flush();
    Ok(())
}

/// Create a vault for the connected wallet
pub async fn create(config: &Config, session: &SessionArgs, force: bool) -> Result<()> {
    let mut client = connect(config, session).await?;

    if client.controller.view(false).await.has_vault {
        warn!("This wallet already has an active vault; the contract may reject the call");
    }

    let value_eth = config.transaction.value_wei as f64 / 1e18;
    if !confirm(
        format!("Create a vault? {} ETH will be attached.", value_eth),
        force,
    )? {
        return Ok(());
    }

    let result = client.controller.create_vault().await;
    client.flush();
    print_outcome(&result?);
    Ok(())
}

/// Deposit into the connected vault
pub async fn deposit(
    config: &Config,
    session: &SessionArgs,
    amount: &str,
    currency: Currency,
    force: bool,
) -> Result<()> {
    let mut client = connect(config, session).await?;

    let view = client.controller.view(false).await;
    if view.is_locked == Some(true) {
        println!("Vault is locked. Run `vault lock` to unlock it before depositing.");
        return Ok(());
    }

    if !confirm(format!("Deposit {} {}?", amount, currency), force)? {
        return Ok(());
    }

    client.controller.open_deposit().await;
    client.controller.set_deposit_amount(amount).await;
    client.controller.set_deposit_currency(currency).await;

    let result = client.controller.submit_deposit().await;
    client.flush();
    print_outcome(&result?);
    Ok(())
}

/// Lock or unlock the connected vault
pub async fn lock(config: &Config, session: &SessionArgs, force: bool) -> Result<()> {
    let mut client = connect(config, session).await?;

    let prompt = match client.controller.view(false).await.is_locked {
        Some(true) => "Unlock the vault?",
        Some(false) => "Lock the vault?",
        None => "Toggle the vault lock?",
    };
    if !confirm(prompt.to_string(), force)? {
        return Ok(());
    }

    let result = client.controller.toggle_lock().await;
    client.flush();
    print_outcome(&result?);
    Ok(())
}

/// List wallet connectors
pub async fn connectors(config: &Config, session: &SessionArgs) -> Result<()> {
    let client = build_controller(config, session)?;
    let default = session.connector(config);

    println!("\n=== WALLET CONNECTORS ===\n");
    for connector in client.controller.connectors() {
        println!(
            "{:<10} {:<16} {:<10} {}{}",
            connector.id,
            connector.name,
            if connector.can_sign { "signing" } else { "read-only" },
            if connector.available { "available" } else { "unavailable" },
            if connector.id == default { " (default)" } else { "" }
        );
    }
    Ok(())
}

/// Connect, then tear the session down again
pub async fn disconnect(config: &Config, session: &SessionArgs) -> Result<()> {
    let mut client = connect(config, session).await?;
    client.controller.disconnect().await?;
    client.flush();
    println!("Disconnected.");
    Ok(())
}

/// Show current configuration (endpoint secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check node, contract and wallet reachability
pub async fn health(config: &Config, session: &SessionArgs) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;
    let rpc = Arc::new(JsonRpcClient::from_config(&config.rpc)?);
    let gateway = JsonRpcGateway::new(
        rpc.clone(),
        config.contract.contract_address(),
        config.transaction.clone(),
    );
    let wallet = NodeWallet::new(rpc.clone(), session.watch_address(config)?);

    // Probes are independent; run them together
    let (rpc_check, wallet_check) =
        futures::join!(check_rpc(&rpc), wallet.connect(session.connector(config)));

    print!("RPC Endpoint... ");
    match rpc_check {
        Ok((chain_id, latency)) => {
            println!("OK ({}ms, chain {})", latency, chain_id);
            if let Some(expected) = config.rpc.chain_id {
                if expected != chain_id {
                    println!("  WARNING: expected chain {}, node reports {}", expected, chain_id);
                    all_healthy = false;
                }
            }
        }
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Vault Contract... ");
    match gateway.contract_address() {
        Some(address) => println!("CONFIGURED ({})", address),
        None => {
            println!("NOT CONFIGURED (set CONTRACT_ADDRESS)");
            all_healthy = false;
        }
    }

    print!("Wallet... ");
    match wallet_check {
        Ok(connected) => match connected.address {
            Some(address) => println!("OK ({})", address.short()),
            None => println!("OK"),
        },
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
    } else {
        println!("Some systems are unhealthy. Check the errors above.");
    }

    Ok(())
}

async fn check_rpc(rpc: &JsonRpcClient) -> Result<(u64, u64)> {
    let start = Instant::now();
    let chain_id = rpc.chain_id().await?;
    let latency = start.elapsed().as_millis() as u64;
    Ok((chain_id, latency))
}
