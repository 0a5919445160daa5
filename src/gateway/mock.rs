//! In-memory gateway for controller tests
//!
//! Behaves like the vault contract: `createVault` activates a locked vault,
//! `toggleVaultLock` flips the lock. Reads and writes are counted, can be
//! made to fail, and either can be held open to observe what happens while
//! a call is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use super::{ContractGateway, VaultCall};
use crate::error::{Error, Result};
use crate::types::{ActionKind, Address, VaultRecord};

pub struct MockGateway {
    contract: Option<Address>,
    vaults: Mutex<HashMap<Address, VaultRecord>>,
    reads: AtomicUsize,
    writes: Mutex<Vec<(Address, VaultCall)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    write_entered: Notify,
    read_gate: Mutex<Option<Arc<Notify>>>,
    read_entered: Notify,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_contract(Some(Address::new([0xc0; 20])))
    }

    /// Gateway with no contract configured
    pub fn unconfigured() -> Self {
        Self::with_contract(None)
    }

    fn with_contract(contract: Option<Address>) -> Self {
        Self {
            contract,
            vaults: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            gate: Mutex::new(None),
            write_entered: Notify::new(),
            read_gate: Mutex::new(None),
            read_entered: Notify::new(),
        }
    }

    /// Seed an on-chain vault for `owner`
    pub fn insert_vault(&self, owner: Address, is_locked: bool) {
        self.vaults
            .lock()
            .unwrap()
            .insert(owner, active_record(owner, is_locked));
    }

    pub fn vault(&self, owner: Address) -> Option<VaultRecord> {
        self.vaults.lock().unwrap().get(&owner).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes wait until the returned gate is notified
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a write has reached the gateway
    pub async fn wait_for_write(&self) {
        self.write_entered.notified().await;
    }

    /// Make subsequent reads wait until the returned gate is notified
    pub fn hold_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a read has reached the gateway
    pub async fn wait_for_read(&self) {
        self.read_entered.notified().await;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Address, VaultCall)> {
        self.writes.lock().unwrap().clone()
    }

    /// Total gateway round trips
    pub fn call_count(&self) -> usize {
        self.read_count() + self.write_count()
    }
}

fn active_record(owner: Address, is_locked: bool) -> VaultRecord {
    VaultRecord {
        balance: 0,
        interest_rate: 5,
        total_interest: 0,
        is_locked,
        is_active: true,
        owner,
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now),
    }
}

fn inactive_record() -> VaultRecord {
    VaultRecord {
        balance: 0,
        interest_rate: 0,
        total_interest: 0,
        is_locked: false,
        is_active: false,
        owner: Address::ZERO,
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    fn contract_address(&self) -> Option<Address> {
        self.contract
    }

    async fn get_vault_info(&self, user: Address) -> Result<VaultRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_entered.notify_one();

        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.contract.is_none() {
            return Err(Error::GatewayUnavailable("mock without contract".to_string()));
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Rpc("node unavailable".to_string()));
        }
        Ok(self.vault(user).unwrap_or_else(inactive_record))
    }

    async fn write(&self, from: Address, call: &VaultCall) -> Result<String> {
        let index = {
            let mut writes = self.writes.lock().unwrap();
            writes.push((from, call.clone()));
            writes.len()
        };
        self.write_entered.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.contract.is_none() {
            return Err(Error::GatewayUnavailable("mock without contract".to_string()));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Rpc("User rejected the request. (code 4001)".to_string()));
        }

        let mut vaults = self.vaults.lock().unwrap();
        match call {
            VaultCall::CreateVault(_) => {
                vaults.insert(from, active_record(from, true));
            }
            VaultCall::Deposit(_) => {
                if !vaults.get(&from).map(|v| v.is_active).unwrap_or(false) {
                    return Err(Error::action_failed(ActionKind::Deposit, "execution reverted: no vault"));
                }
            }
            VaultCall::ToggleVaultLock => match vaults.get_mut(&from) {
                Some(vault) => vault.is_locked = !vault.is_locked,
                None => {
                    return Err(Error::action_failed(ActionKind::Toggle, "execution reverted: no vault"));
                }
            },
        }

        Ok(format!("0x{:064x}", index))
    }
}
