//! Wallet session provider
//!
//! Supplies the connected account. The controller asks a provider to
//! `connect` through one of its connectors and stores the resulting
//! [`Session`]; nothing else in the crate talks to the wallet directly.
//!
//! Connectors:
//! - `rpc`: the account unlocked behind the JSON-RPC endpoint
//!   (`eth_requestAccounts`, falling back to `eth_accounts`). Can sign.
//! - `address`: a fixed address from configuration. Read-only; writes will
//!   be rejected by the node.

#[cfg(test)]
pub(crate) mod mock;
pub mod node;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::types::Session;

pub use node::NodeWallet;

/// Connector id for the node-managed account
pub const RPC_CONNECTOR: &str = "rpc";

/// Connector id for a watched address
pub const ADDRESS_CONNECTOR: &str = "address";

/// A way of establishing a wallet session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Whether sessions from this connector can submit transactions
    pub can_sign: bool,
    /// Whether the connector is usable with the current configuration
    pub available: bool,
}

/// Source of wallet sessions
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connectors this provider offers
    fn connectors(&self) -> Vec<ConnectorInfo>;

    /// Establish a session through `connector_id`
    async fn connect(&self, connector_id: &str) -> Result<Session>;

    /// Tear down the provider side of the session
    async fn disconnect(&self) -> Result<()>;
}
