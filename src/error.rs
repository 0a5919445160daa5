//! Error types for the vault client

use thiserror::Error;

use crate::types::ActionKind;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vault client
#[derive(Error, Debug)]
pub enum Error {
    // Precondition errors
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("No active vault for this address")]
    VaultNotFound,

    // Remote failures (rejected signature, node error, revert)
    #[error("Action {action} failed: {reason}")]
    ActionFailed { action: ActionKind, reason: String },

    // Transport errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("ABI error: {0}")]
    Abi(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Wrap a transport or ABI failure as the failure of a user action
    pub fn action_failed(action: ActionKind, cause: impl std::fmt::Display) -> Self {
        Error::ActionFailed {
            action,
            reason: cause.to_string(),
        }
    }

    /// Check if this error was caused by the user's input or session state
    /// rather than by the chain or the wallet
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::WalletNotConnected
                | Error::InvalidInput(_)
                | Error::GatewayUnavailable(_)
                | Error::VaultNotFound
        )
    }
}
