//! Node-backed wallet provider

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::{ConnectorInfo, WalletProvider, ADDRESS_CONNECTOR, RPC_CONNECTOR};
use crate::error::{Error, Result};
use crate::gateway::JsonRpcClient;
use crate::types::{Address, Session};

/// Wallet provider backed by the JSON-RPC endpoint and an optional watched
/// address from configuration
pub struct NodeWallet {
    rpc: Arc<JsonRpcClient>,
    watch_address: Option<Address>,
}

impl NodeWallet {
    pub fn new(rpc: Arc<JsonRpcClient>, watch_address: Option<Address>) -> Self {
        Self { rpc, watch_address }
    }

    async fn node_account(&self) -> Result<Address> {
        let accounts: Vec<String> = match self.rpc.call("eth_requestAccounts", json!([])).await {
            Ok(accounts) => accounts,
            Err(e) => {
                debug!("eth_requestAccounts failed ({}), trying eth_accounts", e);
                self.rpc.call("eth_accounts", json!([])).await?
            }
        };

        let first = accounts
            .first()
            .ok_or_else(|| Error::Rpc("node exposes no accounts".to_string()))?;
        first.parse()
    }
}

#[async_trait]
impl WalletProvider for NodeWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        vec![
            ConnectorInfo {
                id: RPC_CONNECTOR,
                name: "Node account",
                can_sign: true,
                available: true,
            },
            ConnectorInfo {
                id: ADDRESS_CONNECTOR,
                name: "Watch address",
                can_sign: false,
                available: self.watch_address.is_some(),
            },
        ]
    }

    async fn connect(&self, connector_id: &str) -> Result<Session> {
        let address = match connector_id {
            RPC_CONNECTOR => self.node_account().await?,
            ADDRESS_CONNECTOR => self.watch_address.ok_or_else(|| {
                Error::InvalidInput("no wallet.address configured for the address connector".to_string())
            })?,
            other => {
                return Err(Error::InvalidInput(format!("unknown connector '{}'", other)));
            }
        };

        info!("Connected {} via {}", address.short(), connector_id);
        Ok(Session::connected(address, connector_id))
    }

    async fn disconnect(&self) -> Result<()> {
        // Node accounts have no remote session to close
        debug!("Wallet disconnected");
        Ok(())
    }
}
