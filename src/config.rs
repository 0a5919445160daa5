//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::types::Address;
use crate::wallet::{ADDRESS_CONNECTOR, RPC_CONNECTOR};

/// Null address sentinel used when no contract is deployed
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployed vault contract. The null address means "not configured".
    #[serde(default = "default_contract_address")]
    pub address: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: default_contract_address(),
        }
    }
}

impl ContractConfig {
    /// Contract address, or `None` when unset or the null sentinel
    pub fn contract_address(&self) -> Option<Address> {
        let trimmed = self.address.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<Address>().ok().filter(|a| !a.is_zero())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Expected chain id, checked by `health`
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
            chain_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionConfig {
    /// Value attached to every write, in wei (0.01 ether)
    #[serde(default = "default_value_wei")]
    pub value_wei: u64,
    /// Fixed gas allowance for every write
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            value_wei: default_value_wei(),
            gas_limit: default_gas_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Connector used when none is given on the command line
    #[serde(default = "default_connector")]
    pub default_connector: String,
    /// Watched address for the `address` connector
    #[serde(default)]
    pub address: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            default_connector: default_connector(),
            address: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Advertised APY shown next to the interest figure
    #[serde(default = "default_apy_pct")]
    pub apy_pct: f64,
    /// Preview balance shown until decryption is available
    #[serde(default = "default_preview_balance")]
    pub preview_balance: f64,
    /// Preview accrued interest shown until decryption is available
    #[serde(default = "default_preview_interest")]
    pub preview_interest: f64,
    /// Show figures instead of the mask by default
    #[serde(default)]
    pub reveal: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            apy_pct: default_apy_pct(),
            preview_balance: default_preview_balance(),
            preview_interest: default_preview_interest(),
            reveal: false,
        }
    }
}

// Default value functions
fn default_contract_address() -> String {
    std::env::var("CONTRACT_ADDRESS").unwrap_or_else(|_| NULL_ADDRESS.into())
}

fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8545".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_value_wei() -> u64 {
    10_000_000_000_000_000
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_connector() -> String {
    RPC_CONNECTOR.to_string()
}

fn default_apy_pct() -> f64 {
    8.5
}

fn default_preview_balance() -> f64 {
    12500.75
}

fn default_preview_interest() -> f64 {
    125.50
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("contract.address", default_contract_address())?
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (VAULT__SECTION__KEY)
            .add_source(
                config::Environment::with_prefix("VAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let contract = self.contract.address.trim();
        if !contract.is_empty() {
            contract
                .parse::<Address>()
                .with_context(|| format!("Invalid contract address: {}", contract))?;
        }
        if self.contract.contract_address().is_none() {
            tracing::warn!("No contract address configured - vault reads and writes are disabled");
        }

        let endpoint = url::Url::parse(&self.rpc.endpoint)
            .with_context(|| format!("Invalid rpc endpoint: {}", self.rpc.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("rpc endpoint must be http or https, got {}", endpoint.scheme());
        }

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        if self.transaction.gas_limit == 0 {
            anyhow::bail!("transaction.gas_limit must be positive");
        }

        if !matches!(
            self.wallet.default_connector.as_str(),
            RPC_CONNECTOR | ADDRESS_CONNECTOR
        ) {
            anyhow::bail!(
                "Unknown wallet connector '{}' (expected '{}' or '{}')",
                self.wallet.default_connector,
                RPC_CONNECTOR,
                ADDRESS_CONNECTOR
            );
        }

        if let Some(address) = &self.wallet.address {
            address
                .parse::<Address>()
                .with_context(|| format!("Invalid wallet address: {}", address))?;
        }

        if !self.display.apy_pct.is_finite() || self.display.apy_pct < 0.0 {
            anyhow::bail!("display.apy_pct must be a non-negative number");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Contract:
    address: {}
  RPC:
    endpoint: {}
    timeout: {}ms
    chain_id: {}
  Transaction:
    value: {} wei
    gas_limit: {}
  Wallet:
    default_connector: {}
    address: {}
  Display:
    apy: {}%
    reveal: {}
"#,
            match self.contract.contract_address() {
                Some(address) => address.to_string(),
                None => "(not configured)".to_string(),
            },
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.rpc
                .chain_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "(any)".to_string()),
            self.transaction.value_wei,
            self.transaction.gas_limit,
            self.wallet.default_connector,
            self.wallet.address.as_deref().unwrap_or("(not set)"),
            self.display.apy_pct,
            self.display.reveal,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: ContractConfig::default(),
            rpc: RpcConfig::default(),
            transaction: TransactionConfig::default(),
            wallet: WalletConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transaction.value_wei, 10_000_000_000_000_000);
        assert_eq!(config.transaction.gas_limit, 500_000);
        assert_eq!(config.display.apy_pct, 8.5);
        assert!(!config.display.reveal);
    }

    #[test]
    fn test_null_address_is_not_configured() {
        let contract = ContractConfig {
            address: NULL_ADDRESS.to_string(),
        };
        assert!(contract.contract_address().is_none());

        let empty = ContractConfig {
            address: "  ".to_string(),
        };
        assert!(empty.contract_address().is_none());

        let set = ContractConfig {
            address: "0x1111111111111111111111111111111111111111".to_string(),
        };
        assert!(set.contract_address().is_some());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[contract]
address = "0x2222222222222222222222222222222222222222"

[rpc]
endpoint = "https://sepolia.example.org/rpc?key=secret"
chain_id = 11155111

[transaction]
gas_limit = 750000

[display]
apy_pct = 6.25
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.contract.contract_address().unwrap().to_string(),
            "0x2222222222222222222222222222222222222222"
        );
        assert_eq!(config.rpc.chain_id, Some(11155111));
        assert_eq!(config.transaction.gas_limit, 750_000);
        assert_eq!(config.display.apy_pct, 6.25);
        assert!(config.masked_display().contains("https://sepolia.example.org/rpc?***"));
        assert!(!config.masked_display().contains("secret"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rpc]\ntimeout_ms = 5000").unwrap();

        std::env::set_var("VAULT__RPC__TIMEOUT_MS", "1234");
        let config = Config::load(file.path());
        std::env::remove_var("VAULT__RPC__TIMEOUT_MS");

        assert_eq!(config.unwrap().rpc.timeout_ms, 1234);
    }

    #[test]
    fn test_invalid_contract_address_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[contract]\naddress = \"0x1234\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_unknown_connector_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[wallet]\ndefault_connector = \"walletconnect\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
