//! MultiSignatureWallet payloads
//!
//! Builds the typed data a MultiSignatureWallet signer approves (`Execute`)
//! and the storage positions used to read the wallet's signer weights.

pub mod execute;
pub mod storage;

pub use execute::{Execute, ExecuteLayout, WALLET_NAME, WALLET_VERSION};
pub use storage::{decode_storage_word, get_storage_at_request, mapping_slot, storage_key_hex};
