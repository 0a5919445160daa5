//! Client-side vault state
//!
//! Projects the on-chain vault record for the connected address and applies
//! optimistic updates after successful writes. The model is bound to one
//! address at a time; a record loaded for another address is never shown.
//!
//! ```text
//! Unknown ──read: inactive──▶ NotFound ──create──▶ Active{locked}
//!    │                                                 ▲  │
//!    └──────read: active / create─────────────────────┘  toggle
//!                                                         ▼
//!                                                  Active{unlocked}
//! ```
//!
//! Only a session change (disconnect or a different address) returns the
//! model to `Unknown`.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cipher::FheCipher;
use crate::error::{Error, Result};
use crate::gateway::ContractGateway;
use crate::types::{Address, Session, VaultRecord};

/// Masked figure as rendered to the user
pub const MASK: &str = "••••••";

/// Vault lifecycle as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum VaultStatus {
    /// Not read yet for the current address
    Unknown,
    /// Read completed, no active vault
    NotFound,
    Active { locked: bool },
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultStatus::Unknown => write!(f, "unknown"),
            VaultStatus::NotFound => write!(f, "no vault"),
            VaultStatus::Active { locked: true } => write!(f, "secured"),
            VaultStatus::Active { locked: false } => write!(f, "unlocked"),
        }
    }
}

/// A monetary figure in the view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Figure {
    /// Masked until the user reveals it
    Hidden,
    Shown(f64),
    /// No vault, or no way to decrypt
    Unavailable,
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Figure::Hidden => f.write_str(MASK),
            Figure::Shown(value) => f.write_str(&format_amount(*value)),
            Figure::Unavailable => f.write_str("n/a"),
        }
    }
}

/// Two decimals with thousands separators: `12,500.75`
pub fn format_amount(value: f64) -> String {
    let text = format!("{:.2}", value.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Everything the presentation layer needs to render the vault
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultView {
    pub status: VaultStatus,
    pub connected: bool,
    pub address: Option<Address>,
    pub has_vault: bool,
    /// `None` unless the vault is active
    pub is_locked: Option<bool>,
    pub balance: Figure,
    pub accrued_interest: Figure,
    pub apy_pct: f64,
    /// Deposits are only offered for an unlocked vault
    pub can_deposit: bool,
    pub can_toggle: bool,
}

/// Vault projection bound to a single address
#[derive(Debug, Clone)]
pub struct VaultStateModel {
    bound_to: Option<Address>,
    status: VaultStatus,
    /// Present only while `Active`
    record: Option<VaultRecord>,
}

impl Default for VaultStateModel {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultStateModel {
    pub fn new() -> Self {
        Self {
            bound_to: None,
            status: VaultStatus::Unknown,
            record: None,
        }
    }

    pub fn status(&self) -> VaultStatus {
        self.status
    }

    pub fn record(&self) -> Option<&VaultRecord> {
        self.record.as_ref()
    }

    pub fn bound_address(&self) -> Option<Address> {
        self.bound_to
    }

    pub fn has_vault(&self) -> bool {
        matches!(self.status, VaultStatus::Active { .. })
    }

    pub fn is_locked(&self) -> Option<bool> {
        match self.status {
            VaultStatus::Active { locked } => Some(locked),
            _ => None,
        }
    }

    /// Bind to `address`, dropping anything known about a different one
    pub fn rebind(&mut self, address: Option<Address>) {
        if self.bound_to != address {
            debug!(
                "Vault state rebound from {:?} to {:?}",
                self.bound_to.map(|a| a.short()),
                address.map(|a| a.short())
            );
            self.bound_to = address;
            self.status = VaultStatus::Unknown;
            self.record = None;
        }
    }

    /// Back to `Unknown` with no binding (disconnect)
    pub fn reset(&mut self) {
        self.bound_to = None;
        self.status = VaultStatus::Unknown;
        self.record = None;
    }

    /// First half of a read: check preconditions and bind to the session's
    /// address. The caller performs the gateway read without holding the
    /// model and hands the result to [`apply_record`](Self::apply_record).
    pub fn begin_refresh<G>(&mut self, gateway: &G, session: &Session) -> Result<Address>
    where
        G: ContractGateway + ?Sized,
    {
        let address = session
            .active_address()
            .ok_or_else(|| Error::GatewayUnavailable("no connected address".to_string()))?;
        if !gateway.is_configured() {
            return Err(Error::GatewayUnavailable(
                "no contract address configured".to_string(),
            ));
        }

        self.rebind(Some(address));
        Ok(address)
    }

    /// Fold a read result for `address` into the model. Results for an
    /// address the model is no longer bound to are discarded (`None`).
    pub fn apply_record(&mut self, address: Address, record: VaultRecord) -> Option<VaultStatus> {
        if self.bound_to != Some(address) {
            warn!("Discarding vault read for {} (bound elsewhere)", address.short());
            return None;
        }

        if record.is_active {
            self.status = VaultStatus::Active {
                locked: record.is_locked,
            };
            self.record = Some(record);
        } else {
            self.status = VaultStatus::NotFound;
            self.record = None;
        }
        Some(self.status)
    }

    /// Optimistic `createVault` success for `owner`: active and locked
    pub fn mark_created(&mut self, owner: Address) -> bool {
        if self.bound_to != Some(owner) {
            return false;
        }
        self.status = VaultStatus::Active { locked: true };
        self.record = Some(VaultRecord {
            balance: 0,
            interest_rate: 0,
            total_interest: 0,
            is_locked: true,
            is_active: true,
            owner,
            created_at: Utc::now(),
        });
        true
    }

    /// Optimistic `toggleVaultLock` success for `owner`
    pub fn toggle_locked(&mut self, owner: Address) -> Option<bool> {
        if self.bound_to != Some(owner) {
            return None;
        }
        let locked = !self.is_locked()?;
        self.status = VaultStatus::Active { locked };
        if let Some(record) = self.record.as_mut() {
            record.is_locked = locked;
        }
        Some(locked)
    }

    /// Render-ready view for `session`
    pub fn view(
        &self,
        session: &Session,
        cipher: &dyn FheCipher,
        reveal: bool,
        apy_pct: f64,
    ) -> VaultView {
        let address = session.active_address();

        // A model bound to another address knows nothing about this one
        let (status, record) = if address.is_some() && address == self.bound_to {
            (self.status, self.record.as_ref())
        } else {
            (VaultStatus::Unknown, None)
        };

        let is_locked = match status {
            VaultStatus::Active { locked } => Some(locked),
            _ => None,
        };
        let has_vault = is_locked.is_some();

        let (balance, accrued_interest) = match record {
            Some(_) if !reveal => (Figure::Hidden, Figure::Hidden),
            Some(record) => match cipher.preview(record) {
                Some(preview) => (
                    Figure::Shown(preview.balance),
                    Figure::Shown(preview.accrued_interest),
                ),
                None => (Figure::Unavailable, Figure::Unavailable),
            },
            None => (Figure::Unavailable, Figure::Unavailable),
        };

        VaultView {
            status,
            connected: session.connected,
            address,
            has_vault,
            is_locked,
            balance,
            accrued_interest,
            apy_pct,
            can_deposit: is_locked == Some(false),
            can_toggle: has_vault,
        }
    }
}
