//! Scriptable wallet for controller tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ConnectorInfo, WalletProvider, RPC_CONNECTOR};
use crate::error::{Error, Result};
use crate::types::{Address, Session};

pub struct MockWallet {
    address: Mutex<Address>,
    reject: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self {
            address: Mutex::new(address),
            reject: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// Account returned by the next `connect`
    pub fn set_address(&self, address: Address) {
        *self.address.lock().unwrap() = address;
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        vec![ConnectorInfo {
            id: RPC_CONNECTOR,
            name: "Mock",
            can_sign: true,
            available: true,
        }]
    }

    async fn connect(&self, connector_id: &str) -> Result<Session> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::Rpc("User rejected the request. (code 4001)".to_string()));
        }
        let address = *self.address.lock().unwrap();
        Ok(Session::connected(address, connector_id))
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
