//! Message Signing Module
//!
//! The non-typed Ethereum signing schemes that sit beside EIP-712:
//! - `personal_sign` (EIP-191 `\x19Ethereum Signed Message:\n` prefix)
//! - `eth_sign` (raw 32-byte hash, no prefix)
//!
//! Signing goes through the same injected [`Signer`](crate::eip712::Signer)
//! capability as typed data.

pub mod ethereum;

pub use ethereum::{
    eth_sign, message_bytes, personal_sign, personal_sign_hash, personal_sign_hex, recover_eth_sign,
    recover_personal_sign, verify_eth_sign, verify_personal_sign,
};

use crate::eip712::{Eip712Error, Eip712Signature};
use serde::{Deserialize, Serialize};

/// Serializable message signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature {
    /// `r || s || v` as `0x` hex
    pub signature: String,
    pub r: String,
    pub s: String,
    /// 27 or 28
    pub v: u8,
}

impl From<&Eip712Signature> for MessageSignature {
    fn from(sig: &Eip712Signature) -> Self {
        Self {
            signature: sig.to_hex(),
            r: format!("0x{}", hex::encode(sig.r)),
            s: format!("0x{}", hex::encode(sig.s)),
            v: sig.v,
        }
    }
}

impl MessageSignature {
    /// Raw 65-byte form
    pub fn to_bytes(&self) -> MessageSignResult<Vec<u8>> {
        hex::decode(crate::eip712::strip_hex_prefix(&self.signature))
            .map_err(|e| MessageSignError::InvalidSignature(e.to_string()))
    }
}

/// Error types for message signing
#[derive(Debug, thiserror::Error)]
pub enum MessageSignError {
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Address recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] Eip712Error),
}

pub type MessageSignResult<T> = Result<T, MessageSignError>;
