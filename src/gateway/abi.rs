//! ABI encoding for the vault contract
//!
//! Only the four functions the client calls are supported. Selectors are
//! the first four bytes of `keccak256(signature)`.
//!
//! ```text
//! getVaultInfo(address)      -> (uint8, uint8, uint8, bool, bool, address, uint256)
//! createVault(bytes, bytes)  -> bool      payable
//! deposit(bytes, bytes)      -> uint256   payable
//! toggleVaultLock()                       payable
//! ```

use chrono::DateTime;

use crate::cipher::EncryptedInput;
use crate::error::{Error, Result};
use crate::types::{Address, VaultRecord};

/// ABI word size
pub const WORD: usize = 32;

/// `getVaultInfo(address)`
pub const GET_VAULT_INFO: [u8; 4] = [0x90, 0x22, 0x9a, 0xf7];

/// `createVault(bytes,bytes)`
pub const CREATE_VAULT: [u8; 4] = [0x1c, 0x74, 0xb3, 0xff];

/// `deposit(bytes,bytes)`
pub const DEPOSIT: [u8; 4] = [0x16, 0x4a, 0xf1, 0xdf];

/// `toggleVaultLock()`
pub const TOGGLE_VAULT_LOCK: [u8; 4] = [0x62, 0x48, 0xb3, 0xa2];

/// Number of words in a `getVaultInfo` return
const VAULT_INFO_WORDS: usize = 7;

/// A state-changing vault call
#[derive(Debug, Clone, PartialEq)]
pub enum VaultCall {
    CreateVault(EncryptedInput),
    Deposit(EncryptedInput),
    ToggleVaultLock,
}

impl VaultCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            VaultCall::CreateVault(_) => "createVault",
            VaultCall::Deposit(_) => "deposit",
            VaultCall::ToggleVaultLock => "toggleVaultLock",
        }
    }

    /// Calldata for this call
    pub fn encode(&self) -> Vec<u8> {
        match self {
            VaultCall::CreateVault(input) => encode_bytes_pair(CREATE_VAULT, &input.ciphertext, &input.proof),
            VaultCall::Deposit(input) => encode_bytes_pair(DEPOSIT, &input.ciphertext, &input.proof),
            VaultCall::ToggleVaultLock => TOGGLE_VAULT_LOCK.to_vec(),
        }
    }
}

/// Calldata for `getVaultInfo(user)`
pub fn encode_get_vault_info(user: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&GET_VAULT_INFO);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(user.as_bytes());
    data
}

/// Calldata for a `(bytes, bytes)` function
fn encode_bytes_pair(selector: [u8; 4], first: &[u8], second: &[u8]) -> Vec<u8> {
    let first_offset = 2 * WORD;
    let second_offset = first_offset + WORD + padded_len(first.len());

    let mut data = Vec::with_capacity(4 + second_offset + WORD + padded_len(second.len()));
    data.extend_from_slice(&selector);
    data.extend_from_slice(&uint_word(first_offset as u64));
    data.extend_from_slice(&uint_word(second_offset as u64));
    push_bytes(&mut data, first);
    push_bytes(&mut data, second);
    data
}

fn push_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&uint_word(bytes.len() as u64));
    data.extend_from_slice(bytes);
    data.resize(data.len() + padded_len(bytes.len()) - bytes.len(), 0);
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode the return data of `getVaultInfo`
pub fn decode_vault_info(data: &[u8]) -> Result<VaultRecord> {
    if data.len() < VAULT_INFO_WORDS * WORD {
        return Err(Error::Abi(format!(
            "getVaultInfo returned {} bytes, expected {}",
            data.len(),
            VAULT_INFO_WORDS * WORD
        )));
    }

    let words: Vec<&[u8]> = data.chunks_exact(WORD).take(VAULT_INFO_WORDS).collect();

    let created_at_secs = decode_u64(words[6], "createdAt")?;
    let created_at_secs = i64::try_from(created_at_secs)
        .map_err(|_| Error::Abi(format!("createdAt {} out of range", created_at_secs)))?;
    let created_at = DateTime::from_timestamp(created_at_secs, 0)
        .ok_or_else(|| Error::Abi(format!("createdAt {} is not a valid timestamp", created_at_secs)))?;

    Ok(VaultRecord {
        balance: decode_u8(words[0], "balance")?,
        interest_rate: decode_u8(words[1], "interestRate")?,
        total_interest: decode_u8(words[2], "totalInterest")?,
        is_locked: decode_bool(words[3], "isLocked")?,
        is_active: decode_bool(words[4], "isActive")?,
        owner: decode_address(words[5], "owner")?,
        created_at,
    })
}

fn decode_u8(word: &[u8], field: &str) -> Result<u8> {
    if word[..WORD - 1].iter().any(|b| *b != 0) {
        return Err(Error::Abi(format!("{} does not fit in uint8", field)));
    }
    Ok(word[WORD - 1])
}

fn decode_bool(word: &[u8], field: &str) -> Result<bool> {
    match decode_u8(word, field)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::Abi(format!("{} is not a bool: {}", field, other))),
    }
}

fn decode_address(word: &[u8], field: &str) -> Result<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(Error::Abi(format!("{} has dirty high bytes", field)));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::new(bytes))
}

fn decode_u64(word: &[u8], field: &str) -> Result<u64> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(Error::Abi(format!("{} does not fit in 64 bits", field)));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(bytes))
}

/// `0x`-prefixed hex, `0x` for empty input
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse `0x`-prefixed hex data; `0x` decodes to nothing
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| Error::Abi(format!("invalid hex data: {}", e)))
}

/// JSON-RPC quantity encoding (`0x` + minimal hex)
pub fn to_quantity(value: u64) -> String {
    format!("{:#x}", value)
}

/// Parse a JSON-RPC quantity
pub fn from_quantity(text: &str) -> Result<u64> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| Error::Abi(format!("quantity {} missing 0x prefix", text)))?;
    u64::from_str_radix(digits, 16).map_err(|e| Error::Abi(format!("invalid quantity {}: {}", text, e)))
}
