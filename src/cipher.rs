//! Encryption capability for vault inputs
//!
//! The vault contract takes every amount as an FHE ciphertext plus an input
//! proof, and keeps balances encrypted. Producing those ciphertexts and
//! decrypting balances is delegated to an [`FheCipher`] supplied by the
//! caller. [`PlaceholderCipher`] sends empty payloads (`0x`) and shows fixed
//! preview figures; swap it for a real FHE client to go beyond demo use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::types::{Currency, VaultRecord};

/// Ciphertext and input proof for one encrypted contract argument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub ciphertext: Vec<u8>,
    pub proof: Vec<u8>,
}

impl EncryptedInput {
    /// Empty payload, sent on the wire as `0x`
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.ciphertext.is_empty() && self.proof.is_empty()
    }
}

/// Decrypted figures for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancePreview {
    pub balance: f64,
    pub accrued_interest: f64,
}

/// FHE encryption and decryption, provided from outside the client
#[async_trait]
pub trait FheCipher: Send + Sync {
    /// Cipher name for logging
    fn name(&self) -> &'static str;

    /// Encrypt an amount and produce its input proof
    async fn encrypt(&self, amount: f64, currency: Currency) -> Result<EncryptedInput>;

    /// Plaintext figures for an active vault, if this cipher can provide them
    fn preview(&self, record: &VaultRecord) -> Option<BalancePreview>;
}

/// Stand-in cipher: placeholder payloads and fixed preview figures
#[derive(Debug, Clone, Default)]
pub struct PlaceholderCipher {
    preview: Option<BalancePreview>,
}

impl PlaceholderCipher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview(balance: f64, accrued_interest: f64) -> Self {
        Self {
            preview: Some(BalancePreview {
                balance,
                accrued_interest,
            }),
        }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::with_preview(display.preview_balance, display.preview_interest)
    }
}

#[async_trait]
impl FheCipher for PlaceholderCipher {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn encrypt(&self, amount: f64, currency: Currency) -> Result<EncryptedInput> {
        debug!("Placeholder encryption for {} {}", amount, currency);
        Ok(EncryptedInput::placeholder())
    }

    fn preview(&self, record: &VaultRecord) -> Option<BalancePreview> {
        if record.is_active {
            self.preview
        } else {
            None
        }
    }
}
