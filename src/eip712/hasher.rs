//! Struct hashes, domain separators and the `0x1901` signing digest

use super::encoder::{encode_data, keccak256};
use super::types::*;
use crate::log_debug;
use std::collections::HashMap;

/// EIP-191 version byte `0x01` for structured data
const STRUCTURED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Hash a struct according to EIP-712
///
/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn struct_hash(
    type_name: &str,
    data: &serde_json::Value,
    types: &TypeSchema,
) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_data(type_name, data, types, type_name)?;
    Ok(keccak256(&encoded))
}

/// Calculate the domain separator hash
///
/// domainSeparator = hashStruct(eip712Domain), over exactly the declared
/// domain fields in their declared order.
pub fn domain_separator(
    domain_fields: &[TypedDataField],
    domain_values: &serde_json::Value,
) -> Result<[u8; 32], Eip712Error> {
    let mut types = HashMap::with_capacity(1);
    types.insert(DOMAIN_TYPE_NAME.to_string(), domain_fields.to_vec());

    struct_hash(DOMAIN_TYPE_NAME, domain_values, &types)
}

/// Combine a domain separator and a struct hash into the signing digest
///
/// digest = keccak256("\x19\x01" || domainSeparator || structHash)
pub fn digest_from_parts(domain_separator: &[u8; 32], struct_hash: Option<&[u8; 32]>) -> [u8; 32] {
    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(&STRUCTURED_DATA_PREFIX);
    data.extend_from_slice(domain_separator);
    if let Some(struct_hash) = struct_hash {
        data.extend_from_slice(struct_hash);
    }
    keccak256(&data)
}

/// Calculate the EIP-712 digest for signing
///
/// When `primary_type` is `EIP712Domain` the message is ignored and the digest
/// covers the domain separator alone, as wallets do for `eth_signTypedData_v3`.
pub fn signing_digest(
    types: &TypeSchema,
    primary_type: &str,
    domain_values: &serde_json::Value,
    message: &serde_json::Value,
) -> Result<[u8; 32], Eip712Error> {
    pre_image_parts(types, primary_type, domain_values, message).map(|p| p.digest)
}

/// The intermediate hashes behind a signing digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: [u8; 32],
    /// Absent when the primary type is `EIP712Domain`
    pub struct_hash: Option<[u8; 32]>,
    pub digest: [u8; 32],
}

fn pre_image_parts(
    types: &TypeSchema,
    primary_type: &str,
    domain_values: &serde_json::Value,
    message: &serde_json::Value,
) -> Result<Eip712PreImage, Eip712Error> {
    let domain_fields = types
        .get(DOMAIN_TYPE_NAME)
        .ok_or_else(|| Eip712Error::schema(DOMAIN_TYPE_NAME, "domain type is not declared"))?;

    let domain_separator = domain_separator(domain_fields, domain_values)?;

    let struct_hash = if primary_type == DOMAIN_TYPE_NAME {
        None
    } else {
        Some(struct_hash(primary_type, message, types)?)
    };

    let digest = digest_from_parts(&domain_separator, struct_hash.as_ref());

    log_debug!(
        "eip712",
        "computed signing digest",
        primary_type = primary_type,
        domain_hash = hex::encode(domain_separator),
        digest_hash = hex::encode(digest),
    );

    Ok(Eip712PreImage {
        domain_separator,
        struct_hash,
        digest,
    })
}

/// Validate a typed data document and compute its signing digest
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    get_pre_image(typed_data).map(|p| p.digest)
}

/// Validate a typed data document and compute every intermediate hash
pub fn get_pre_image(typed_data: &TypedData) -> Result<Eip712PreImage, Eip712Error> {
    typed_data.validate()?;
    pre_image_parts(
        &typed_data.types,
        &typed_data.primary_type,
        &typed_data.domain,
        &typed_data.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// The `Mail` document from EIP-712, built through the domain builder
    fn mail() -> TypedData {
        let domain = Eip712Domain {
            name: Some("Ether Mail".into()),
            version: Some("1".into()),
            chain_id: Some(1),
            verifying_contract: Some("0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC".into()),
            salt: None,
        };

        let mut types = TypeSchema::new();
        types.insert(
            "Person".into(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("wallet", "address"),
            ],
        );
        types.insert(
            "Mail".into(),
            vec![
                TypedDataField::new("from", "Person"),
                TypedDataField::new("to", "Person"),
                TypedDataField::new("contents", "string"),
            ],
        );

        let message = json!({
            "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
            "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
            "contents": "Hello, Bob!",
        });

        TypedData::new(&domain, types, "Mail", message)
    }

    #[test]
    fn test_mail_digest() {
        assert_eq!(
            hex::encode(hash_typed_data(&mail()).unwrap()),
            "be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
        );
    }

    #[test]
    fn test_domain_separator() {
        let typed_data = mail();
        let separator =
            domain_separator(typed_data.domain_fields().unwrap(), &typed_data.domain).unwrap();

        assert_eq!(
            hex::encode(separator),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
    }

    #[test]
    fn test_pre_image_parts() {
        let typed_data = mail();
        let pre_image = get_pre_image(&typed_data).unwrap();

        assert_eq!(
            hex::encode(pre_image.struct_hash.unwrap()),
            "c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e"
        );
        assert_eq!(pre_image.digest, hash_typed_data(&typed_data).unwrap());
    }

    #[test]
    fn test_domain_primary_type_skips_message() {
        let mut typed_data = mail();
        typed_data.primary_type = DOMAIN_TYPE_NAME.to_string();
        typed_data.message = json!({});

        let pre_image = get_pre_image(&typed_data).unwrap();
        assert_eq!(pre_image.struct_hash, None);
        assert_eq!(
            pre_image.digest,
            digest_from_parts(&pre_image.domain_separator, None)
        );
    }

    #[test]
    fn test_missing_domain_type() {
        let mut typed_data = mail();
        typed_data.types.remove(DOMAIN_TYPE_NAME);

        let err = signing_digest(
            &typed_data.types,
            "Mail",
            &typed_data.domain,
            &typed_data.message,
        )
        .unwrap_err();
        assert!(err.is_schema_error());
    }
}
