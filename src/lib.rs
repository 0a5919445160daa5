//! FHE Vault Client Library
//!
//! Client for a confidential savings vault contract: wallet session,
//! contract gateway, vault state and the user actions on top of them.

pub mod cipher;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod types;
pub mod vault;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use vault::VaultController;
