//! Ethereum JSON-RPC transport and the contract gateway built on it
//!
//! Reads go through `eth_call`, writes through `eth_sendTransaction`, which
//! leaves signing to the wallet behind the endpoint (a node-managed account
//! or a signing proxy).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::abi::{self, VaultCall};
use super::ContractGateway;
use crate::config::{RpcConfig, TransactionConfig};
use crate::error::{Error, Result};
use crate::types::{Address, VaultRecord};

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC client over HTTP
pub struct JsonRpcClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), Duration::from_millis(config.timeout_ms))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one JSON-RPC call
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!("RPC -> {} (id {})", method, request.id);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Rpc(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse {} response: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(Error::Rpc(format!("{} (code {})", error.message, error.code)));
        }

        body.result
            .ok_or_else(|| Error::Rpc(format!("{} returned no result", method)))
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64> {
        let quantity: String = self.call("eth_chainId", json!([])).await?;
        abi::from_quantity(&quantity)
    }
}

/// Contract gateway for a fixed vault contract
pub struct JsonRpcGateway {
    rpc: Arc<JsonRpcClient>,
    contract: Option<Address>,
    transaction: TransactionConfig,
}

impl JsonRpcGateway {
    /// `contract` of `None` or the null address leaves the gateway unconfigured
    pub fn new(rpc: Arc<JsonRpcClient>, contract: Option<Address>, transaction: TransactionConfig) -> Self {
        Self {
            rpc,
            contract: contract.filter(|address| !address.is_zero()),
            transaction,
        }
    }

    fn target(&self) -> Result<Address> {
        self.contract
            .ok_or_else(|| Error::GatewayUnavailable("no contract address configured".to_string()))
    }
}

#[async_trait]
impl ContractGateway for JsonRpcGateway {
    fn contract_address(&self) -> Option<Address> {
        self.contract
    }

    async fn get_vault_info(&self, user: Address) -> Result<VaultRecord> {
        let contract = self.target()?;
        let data = abi::encode_get_vault_info(&user);

        let params = json!([
            { "to": contract.to_string(), "data": abi::to_hex(&data) },
            "latest"
        ]);
        let output: String = self.rpc.call("eth_call", params).await?;

        abi::decode_vault_info(&abi::from_hex(&output)?)
    }

    async fn write(&self, from: Address, call: &VaultCall) -> Result<String> {
        let contract = self.target()?;
        let data = call.encode();

        info!(
            "Submitting {} from {} (value {} wei, gas {})",
            call.function_name(),
            from.short(),
            self.transaction.value_wei,
            self.transaction.gas_limit
        );

        let params = json!([{
            "from": from.to_string(),
            "to": contract.to_string(),
            "data": abi::to_hex(&data),
            "value": abi::to_quantity(self.transaction.value_wei),
            "gas": abi::to_quantity(self.transaction.gas_limit),
        }]);

        let tx_hash: String = self.rpc.call("eth_sendTransaction", params).await?;
        debug!("{} accepted: {}", call.function_name(), tx_hash);
        Ok(tx_hash)
    }
}
