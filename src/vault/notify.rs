//! User-visible notifications, one per completed action

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::types::{ActionKind, DepositRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub action: Option<ActionKind>,
}

impl Notification {
    pub fn success(action: ActionKind, title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.to_string(),
            description: description.into(),
            action: Some(action),
        }
    }

    pub fn error(action: Option<ActionKind>, title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            description: description.into(),
            action,
        }
    }

    pub fn vault_created() -> Self {
        Self::success(
            ActionKind::Create,
            "Vault Created",
            "Your FHE-protected vault is ready. It starts locked.",
        )
    }

    pub fn deposited(request: &DepositRequest) -> Self {
        Self::success(
            ActionKind::Deposit,
            "Deposit Successful",
            format!(
                "{} {} has been securely deposited with FHE protection.",
                request.amount, request.currency
            ),
        )
    }

    pub fn lock_changed(locked: bool) -> Self {
        if locked {
            Self::success(ActionKind::Toggle, "Vault Locked", "Your vault is secured.")
        } else {
            Self::success(
                ActionKind::Toggle,
                "Vault Unlocked",
                "Deposits are now enabled.",
            )
        }
    }

    /// Notification for a failed action
    pub fn from_error(action: ActionKind, error: &Error) -> Self {
        match error {
            Error::WalletNotConnected => Self::error(
                Some(action),
                "Wallet Not Connected",
                "Please connect your wallet first.",
            ),
            Error::InvalidInput(_) if action == ActionKind::Deposit => Self::error(
                Some(action),
                "Invalid Amount",
                "Please enter a valid deposit amount.",
            ),
            Error::InvalidInput(message) => Self::error(Some(action), "Invalid Input", message.clone()),
            Error::GatewayUnavailable(_) => Self::error(
                Some(action),
                "Contract Unavailable",
                "No vault contract is configured. Set CONTRACT_ADDRESS.",
            ),
            Error::VaultNotFound => Self::error(
                Some(action),
                "No Vault",
                "Create a vault before using it.",
            ),
            _ => match action {
                ActionKind::Create => Self::error(
                    Some(action),
                    "Failed to create vault",
                    error.to_string(),
                ),
                ActionKind::Deposit => Self::error(
                    Some(action),
                    "Deposit Failed",
                    "Failed to process deposit. Please try again.",
                ),
                ActionKind::Toggle => Self::error(
                    Some(action),
                    "Failed to toggle vault lock",
                    error.to_string(),
                ),
                ActionKind::Refresh => Self::error(
                    Some(action),
                    "Failed to load vault",
                    error.to_string(),
                ),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
