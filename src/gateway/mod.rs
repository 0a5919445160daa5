//! Contract gateway
//!
//! Adapter between the vault controller and the deployed vault contract.
//! It owns ABI encoding and the transport; callers see typed reads and
//! writes against a fixed contract address.
//!
//! # Architecture
//!
//! ```text
//! VaultController → ContractGateway → JsonRpcClient → node / wallet
//!                         ↑
//!                     abi (calldata, return decoding)
//! ```
//!
//! A gateway without a contract address (unset or the null address) is
//! "not configured": every call fails with `GatewayUnavailable` before any
//! I/O happens.

pub mod abi;
#[cfg(test)]
pub(crate) mod mock;
pub mod rpc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Address, VaultRecord};

pub use abi::VaultCall;
pub use rpc::{JsonRpcClient, JsonRpcGateway};

/// Typed access to the vault contract
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Target contract, `None` when not configured
    fn contract_address(&self) -> Option<Address>;

    /// Whether calls can be attempted at all
    fn is_configured(&self) -> bool {
        self.contract_address().is_some()
    }

    /// `getVaultInfo(user)`, read-only
    async fn get_vault_info(&self, user: Address) -> Result<VaultRecord>;

    /// Submit a state-changing call from `from`, attaching the configured
    /// value and gas allowance. Returns the transaction hash once the wallet
    /// accepts it; block inclusion is not awaited.
    async fn write(&self, from: Address, call: &VaultCall) -> Result<String>;
}
