//! MultiSignatureWallet EIP-712 Core Library
//!
//! Computes the EIP-712 digests MultiSignatureWallet signers approve, and
//! signs and recovers them.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: Schema-driven typed data hashing, signing and recovery
//! - **multisig**: `Execute` payload layouts and wallet storage positions
//! - **message_signer**: EIP-191 `personal_sign` and raw `eth_sign`
//! - **utils**: Redacting structured logging and service configuration
//!
//! # Security
//!
//! Signatures are zeroized on drop and configuration secrets are held in
//! `secrecy` wrappers so they never reach `Debug` output or logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use multisig_eip712::multisig::{Execute, ExecuteLayout};
//!
//! let execute = Execute::new(0u64, "0x9dd1e8169e76a9226b07ab9f85cc20a5e1ed44dd", 600_000u64, "0x654321")?;
//! let digest = execute.digest(ExecuteLayout::Typed, 1)?;
//! ```

pub mod eip712;
pub mod error;
pub mod message_signer;
pub mod multisig;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, MultisigError, MultisigResult};

pub use eip712::{
    checksum_address, domain_separator, encode_type, encode_value, get_pre_image,
    hash_typed_data, keccak256, recover_address, sign_typed_data, signing_digest, struct_hash,
    type_hash, Eip712Error, Eip712PreImage, Eip712Signature, LocalSigner, Signer, TypeSchema,
    TypedData, TypedDataField,
};
pub use multisig::{Execute, ExecuteLayout};
