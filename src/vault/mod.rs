//! Vault state and user actions
//!
//! - `state`: what the client knows about the connected address's vault
//! - `controller`: createVault, deposit, toggleLock and the session lifecycle
//! - `deposit`: the deposit form being edited
//! - `notify`: one user-facing notification per action

pub mod controller;
pub mod deposit;
pub mod notify;
pub mod state;

pub use controller::{PendingActions, VaultController};
pub use deposit::DepositForm;
pub use notify::{Notification, NotificationLevel};
pub use state::{format_amount, Figure, VaultStateModel, VaultStatus, VaultView};
