//! Schema-driven EIP-712 hashing
//!
//! Nothing here knows about a particular message: the domain fields, the
//! struct types and the primary type are all read from the [`TypedData`]
//! document, so any `eth_signTypedData_v3` payload hashes the same way.
//!
//! The pipeline is `encode_type` -> `type_hash` -> `encode_data` ->
//! `struct_hash`, with the domain hashed through the same path and joined
//! by [`signing_digest`]. Signing is a capability ([`Signer`]) applied to
//! the finished digest.
//!
//! See <https://eips.ethereum.org/EIPS/eip-712>.

pub mod encoder;
pub mod hasher;
pub mod signer;
pub mod types;

pub use encoder::{
    encode_data, encode_type, encode_value, find_type_dependencies, keccak256,
    parse_address, type_hash, validate_schema,
};
pub use hasher::{
    digest_from_parts, domain_separator, get_pre_image, hash_typed_data, signing_digest,
    struct_hash, Eip712PreImage,
};
pub use signer::{
    checksum_address, public_key_to_address, recover_address, sign_typed_data, verify_signature,
    verify_typed_data, LocalSigner, Signer,
};
pub use types::{
    strip_hex_prefix, Eip712Domain, Eip712Error, Eip712Signature, FieldType, TypeSchema,
    TypedData, TypedDataField, DOMAIN_TYPE_NAME,
};
