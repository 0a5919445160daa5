//! Core types shared by the gateway, wallet and vault modules
//!
//! Defines account addresses, the client-side vault projection, deposit
//! requests and transaction receipts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 20-byte account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// Null address, used as the "not configured" sentinel
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Abbreviated form for badges: `0x1234...abcd`
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.len() != 40 {
            return Err(Error::InvalidInput(format!(
                "address must be 40 hex digits, got {}",
                digits.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid address {}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Stablecoins accepted by the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usdc,
    Usdt,
    Dai,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usdc, Currency::Usdt, Currency::Dai];

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usdc => "USDC",
            Currency::Usdt => "USDT",
            Currency::Dai => "DAI",
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USDC" => Ok(Currency::Usdc),
            "USDT" => Ok(Currency::Usdt),
            "DAI" => Ok(Currency::Dai),
            other => Err(Error::InvalidInput(format!(
                "unsupported currency {} (expected USDC, USDT or DAI)",
                other
            ))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// User actions that submit a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Deposit,
    Toggle,
    /// Vault read, only used for error reporting
    Refresh,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Create => "create",
            ActionKind::Deposit => "deposit",
            ActionKind::Toggle => "toggle",
            ActionKind::Refresh => "refresh",
        };
        f.write_str(name)
    }
}

/// Validated deposit, never persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositRequest {
    pub amount: f64,
    pub currency: Currency,
}

impl DepositRequest {
    /// Build a request from a positive, finite amount
    pub fn new(amount: f64, currency: Currency) -> Result<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "deposit amount must be a positive number, got {}",
                amount
            )));
        }
        Ok(Self { amount, currency })
    }

    /// Parse the amount as typed by the user
    pub fn parse(amount_text: &str, currency: Currency) -> Result<Self> {
        let text = amount_text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("deposit amount is empty".to_string()));
        }

        let amount: f64 = text
            .parse()
            .map_err(|_| Error::InvalidInput(format!("deposit amount {:?} is not a number", text)))?;

        Self::new(amount, currency)
    }
}

/// Client-side projection of the on-chain vault record
///
/// `balance`, `interest_rate` and `total_interest` are encrypted handles as
/// returned by `getVaultInfo`; they are not amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub balance: u8,
    pub interest_rate: u8,
    pub total_interest: u8,
    pub is_locked: bool,
    pub is_active: bool,
    pub owner: Address,
    pub created_at: DateTime<Utc>,
}

/// Wallet session as seen by the rest of the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub connected: bool,
    /// Connector that established the session
    pub connector: Option<String>,
}

impl Session {
    pub fn connected(address: Address, connector: impl Into<String>) -> Self {
        Self {
            address: Some(address),
            connected: true,
            connector: Some(connector.into()),
        }
    }

    /// Address of a live session, if any
    pub fn active_address(&self) -> Option<Address> {
        if self.connected {
            self.address
        } else {
            None
        }
    }
}

/// Proof that the wallet accepted a transaction. Says nothing about inclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub action: ActionKind,
    pub submitted_at: DateTime<Utc>,
}

/// Result of a guarded user action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The transaction was accepted by the wallet
    Submitted(TxReceipt),
    /// The same action was already in flight; nothing was sent
    Skipped,
}

impl ActionOutcome {
    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            ActionOutcome::Submitted(receipt) => Some(receipt),
            ActionOutcome::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ActionOutcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_and_display() {
        let addr: Address = "0x00000000000000000000000000000000000000Ab".parse().unwrap();
        assert_eq!(addr.to_string(), "0x00000000000000000000000000000000000000ab");
        assert!(!addr.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz00000000000000000000000000000000000000".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_short() {
        let addr: Address = "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap();
        assert_eq!(addr.short(), "0x1234...5678");
    }

    #[test]
    fn test_address_serde() {
        let addr: Address = "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, r#""0x1234567890abcdef1234567890abcdef12345678""#);
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usdt".parse::<Currency>().unwrap(), Currency::Usdt);
        assert_eq!(" DAI ".parse::<Currency>().unwrap(), Currency::Dai);
        assert!("EURC".parse::<Currency>().is_err());
        assert_eq!(Currency::default(), Currency::Usdc);
    }

    #[test]
    fn test_deposit_request_rejects_non_positive() {
        for text in ["", "   ", "abc", "0", "-5", "0.0", "NaN", "inf", "-inf"] {
            let result = DepositRequest::parse(text, Currency::Usdc);
            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "{:?} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_deposit_request_accepts_positive() {
        let request = DepositRequest::parse(" 150.25 ", Currency::Dai).unwrap();
        assert_eq!(request.amount, 150.25);
        assert_eq!(request.currency, Currency::Dai);
    }

    #[test]
    fn test_session_active_address() {
        let addr = Address::new([7u8; 20]);
        let session = Session::connected(addr, "rpc");
        assert_eq!(session.active_address(), Some(addr));

        let stale = Session {
            address: Some(addr),
            connected: false,
            connector: None,
        };
        assert_eq!(stale.active_address(), None);
        assert_eq!(Session::default().active_address(), None);
    }
}
