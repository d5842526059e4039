//! Storage layout helpers
//!
//! The wallet keys both its required-signature count (by its own address) and
//! each signer's weight (by the signer address) at the address left-padded
//! to 32 bytes.

use crate::eip712::{parse_address, strip_hex_prefix, Eip712Error};
use ethers_core::types::U256;
use serde_json::json;

/// Storage position for `address`: the address left-padded to 32 bytes
pub fn mapping_slot(address: &str) -> Result<[u8; 32], Eip712Error> {
    let bytes = parse_address(address, "address")?;
    let mut slot = [0u8; 32];
    slot[12..].copy_from_slice(&bytes);
    Ok(slot)
}

/// `0x` hex form of [`mapping_slot`], as passed to `eth_getStorageAt`
pub fn storage_key_hex(address: &str) -> Result<String, Eip712Error> {
    Ok(format!("0x{}", hex::encode(mapping_slot(address)?)))
}

/// JSON-RPC request body reading `slot_owner`'s entry from `wallet`'s storage
pub fn get_storage_at_request(
    wallet: &str,
    slot_owner: &str,
    id: u64,
) -> Result<serde_json::Value, Eip712Error> {
    let wallet_bytes = parse_address(wallet, "wallet")?;

    Ok(json!({
        "jsonrpc": "2.0",
        "method": "eth_getStorageAt",
        "params": [
            format!("0x{}", hex::encode(wallet_bytes)),
            storage_key_hex(slot_owner)?,
            "latest"
        ],
        "id": id
    }))
}

/// Decode the 32-byte word an `eth_getStorageAt` call returns
pub fn decode_storage_word(word: &str) -> Result<U256, Eip712Error> {
    let digits = strip_hex_prefix(word.trim());
    if digits.is_empty() || digits.len() > 64 {
        return Err(Eip712Error::encoding(
            "storage",
            "uint256",
            format!("expected 1 to 64 hex digits, got {}", digits.len()),
        ));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| Eip712Error::encoding("storage", "uint256", format!("invalid hex: {:?}", e)))
}
