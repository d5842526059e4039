//! EIP-712 Signing
//!
//! The signing capability is injected: anything that can turn a 32-byte
//! digest into a recoverable ECDSA signature implements [`Signer`].
//! Recovery and verification are plain functions over the digest.

use super::encoder::keccak256;
use super::hasher::hash_typed_data;
use super::types::*;
use crate::log_debug;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

/// A capability that signs EIP-712 digests
pub trait Signer {
    /// The signer's address, EIP-55 checksummed
    fn address(&self) -> String;

    /// Sign a 32-byte digest without any further prefixing
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Eip712Signature, Eip712Error>;
}

/// A secp256k1 key held in process memory
pub struct LocalSigner {
    secret_key: SecretKey,
    address: [u8; 20],
}

impl LocalSigner {
    /// Create from a 32-byte private key
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, Eip712Error> {
        if private_key.len() != 32 {
            return Err(Eip712Error::SigningError(format!(
                "invalid private key length: expected 32, got {}",
                private_key.len()
            )));
        }

        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// Create from a hex private key (with or without `0x`)
    pub fn from_hex(private_key_hex: &str) -> Result<Self, Eip712Error> {
        let bytes = Zeroizing::new(
            hex::decode(strip_hex_prefix(private_key_hex.trim()))
                .map_err(|e| Eip712Error::SigningError(format!("invalid key hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Generate a fresh key from the OS random number generator
    pub fn random() -> Self {
        let secret_key = SecretKey::new(&mut rand::rngs::OsRng);
        Self::from_secret_key(secret_key)
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let address = public_key_to_address(&public_key);
        Self {
            secret_key,
            address,
        }
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &checksum_address(&self.address))
            .finish_non_exhaustive()
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> String {
        checksum_address(&self.address)
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Eip712Signature, Eip712Error> {
        let secp = Secp256k1::new();

        let message = Message::from_digest_slice(digest)
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;

        let (recovery_id, signature) = secp
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&signature[0..32]);
        s.copy_from_slice(&signature[32..64]);

        // v is recovery_id + 27 (Ethereum standard)
        let v = recovery_id.to_i32() as u8 + 27;

        Ok(Eip712Signature::new(r, s, v))
    }
}

/// `ethers` wallets can be injected directly
impl Signer for ethers_signers::LocalWallet {
    fn address(&self) -> String {
        let address = ethers_signers::Signer::address(self);
        checksum_address(&address.0)
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Eip712Signature, Eip712Error> {
        let signature = self
            .sign_hash(ethers_core::types::H256::from(*digest))
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        signature.r.to_big_endian(&mut r);
        signature.s.to_big_endian(&mut s);

        let v = u8::try_from(signature.v)
            .map_err(|_| Eip712Error::SigningError(format!("unexpected v {}", signature.v)))?;

        Ok(Eip712Signature::new(r, s, v))
    }
}

/// Sign EIP-712 typed data
pub fn sign_typed_data(
    signer: &dyn Signer,
    typed_data: &TypedData,
) -> Result<Eip712Signature, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    let signature = signer.sign_digest(&hash)?;

    log_debug!(
        "eip712",
        "signed typed data",
        signer = signer.address(),
        signature = signature.to_hex(),
    );

    Ok(signature)
}

/// Verify an EIP-712 signature
///
/// Returns true if the signature is valid for the given address.
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    verify_signature(&hash, signature, expected_address)
}

/// Verify a signature against a digest and expected address
pub fn verify_signature(
    digest: &[u8; 32],
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    let recovered = recover_address(digest, signature)?;

    let expected = strip_hex_prefix(expected_address.trim()).to_lowercase();
    let recovered = strip_hex_prefix(&recovered).to_lowercase();

    Ok(expected == recovered)
}

/// Recover the signer's address from a signature
pub fn recover_address(
    digest: &[u8; 32],
    signature: &Eip712Signature,
) -> Result<String, Eip712Error> {
    let secp = Secp256k1::new();

    let recovery_id = RecoveryId::from_i32(i32::from(signature.recovery_id()?))
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable_sig = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest_slice(digest)
        .map_err(|e| Eip712Error::SigningError(e.to_string()))?;

    let public_key = secp
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    Ok(checksum_address(&public_key_to_address(&public_key)))
}

/// Convert a secp256k1 public key to an Ethereum address
pub fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    // Uncompressed key is 0x04 || X || Y; the address hashes X || Y
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&pubkey_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Compute the EIP-55 checksum address
pub fn checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    checksummed
}
