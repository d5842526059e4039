//! Ethereum Personal Message Signing (EIP-191)
//!
//! Implements personal_sign and eth_sign functionality.
//! Reference: https://eips.ethereum.org/EIPS/eip-191
//!
//! Format: "\x19Ethereum Signed Message:\n" + len(message) + message

use super::{MessageSignError, MessageSignResult, MessageSignature};
use crate::eip712::{keccak256, recover_address, strip_hex_prefix, Eip712Error, Eip712Signature, Signer};
use crate::log_debug;

/// Ethereum message prefix for personal_sign
const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hash a message with the Ethereum personal sign prefix
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign a message using Ethereum personal_sign
///
/// # Arguments
/// * `message` - The raw message to sign (UTF-8 string or raw bytes)
/// * `signer` - The signing capability
pub fn personal_sign(message: &[u8], signer: &dyn Signer) -> MessageSignResult<MessageSignature> {
    let hash = personal_sign_hash(message);
    let signature = signer.sign_digest(&hash)?;

    log_debug!(
        "message_signer",
        "personal_sign",
        signer = signer.address(),
        message_len = message.len(),
    );

    Ok(MessageSignature::from(&signature))
}

/// Message bytes from user input: `0x`-prefixed input is hex-decoded,
/// anything else is taken as UTF-8 text
pub fn message_bytes(input: &str) -> MessageSignResult<Vec<u8>> {
    if input.starts_with("0x") || input.starts_with("0X") {
        decode_hex_message(input)
    } else {
        Ok(input.as_bytes().to_vec())
    }
}

/// Sign a hex-encoded message (with or without 0x prefix)
pub fn personal_sign_hex(hex_message: &str, signer: &dyn Signer) -> MessageSignResult<MessageSignature> {
    let message = decode_hex_message(hex_message)?;
    personal_sign(&message, signer)
}

/// Sign a 32-byte hash directly (eth_sign style, NO prefix applied)
///
/// eth_sign can be used to sign transaction hashes; prefer personal_sign or
/// typed data for anything a user reads.
pub fn eth_sign(hash: &[u8; 32], signer: &dyn Signer) -> MessageSignResult<MessageSignature> {
    let signature = signer.sign_digest(hash)?;
    Ok(MessageSignature::from(&signature))
}

/// Recover the signer's address from a personal_sign signature
///
/// `signature` is 65 bytes: r[32] + s[32] + v[1]
pub fn recover_personal_sign(message: &[u8], signature: &[u8]) -> MessageSignResult<String> {
    recover_eth_sign(&personal_sign_hash(message), signature)
}

/// Verify an Ethereum personal_sign signature against an expected address
pub fn verify_personal_sign(
    message: &[u8],
    signature: &[u8],
    address: &str,
) -> MessageSignResult<bool> {
    let recovered = recover_personal_sign(message, signature)?;
    Ok(same_address(&recovered, address))
}

/// Recover the signer's address from an eth_sign signature
pub fn recover_eth_sign(hash: &[u8; 32], signature: &[u8]) -> MessageSignResult<String> {
    let signature = Eip712Signature::from_bytes(signature).map_err(into_signature_error)?;

    signature.recovery_id().map_err(into_signature_error)?;

    recover_address(hash, &signature).map_err(|e| match e {
        Eip712Error::InvalidSignature(reason) => MessageSignError::RecoveryFailed(reason),
        other => MessageSignError::from(other),
    })
}

/// Verify an eth_sign signature against an expected address
pub fn verify_eth_sign(hash: &[u8; 32], signature: &[u8], address: &str) -> MessageSignResult<bool> {
    let recovered = recover_eth_sign(hash, signature)?;
    Ok(same_address(&recovered, address))
}

fn decode_hex_message(hex_message: &str) -> MessageSignResult<Vec<u8>> {
    hex::decode(strip_hex_prefix(hex_message.trim()))
        .map_err(|e| MessageSignError::InvalidMessage(format!("Invalid hex: {}", e)))
}

fn into_signature_error(e: Eip712Error) -> MessageSignError {
    match e {
        Eip712Error::InvalidSignature(reason) => MessageSignError::InvalidSignature(reason),
        other => MessageSignError::from(other),
    }
}

fn same_address(a: &str, b: &str) -> bool {
    strip_hex_prefix(a.trim()).eq_ignore_ascii_case(strip_hex_prefix(b.trim()))
}
