//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data hashing and signing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroize;

/// Name of the struct type every domain separator is built from.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Struct name -> ordered field list
pub type TypeSchema = HashMap<String, Vec<TypedDataField>>;

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "Person[]")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A parsed type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Address,
    Bool,
    /// `uintN`, width in bits
    Uint(u16),
    /// `intN`, width in bits
    Int(u16),
    /// `bytesN`, width in bytes
    FixedBytes(u8),
    Bytes,
    String,
    /// Reference to a declared struct type
    Struct(String),
    /// `T[]` (None) or `T[k]` (Some(k))
    Array(Box<FieldType>, Option<usize>),
}

impl FieldType {
    /// Parse a type expression such as `uint256`, `Person` or `bytes32[][4]`.
    ///
    /// Struct references are not checked against a schema here; any valid
    /// identifier that is not an elementary type parses as [`FieldType::Struct`].
    /// The expression must already be in canonical form (`uint256`, not
    /// `uint0256` or `uint256 `) since it is hashed verbatim by `encodeType`.
    pub fn parse(type_name: &str) -> Result<Self, Eip712Error> {
        let parsed = Self::parse_expression(type_name)?;
        if parsed.to_string() != type_name {
            return Err(Eip712Error::schema(
                type_name,
                format!("not in canonical form, expected `{}`", parsed),
            ));
        }
        Ok(parsed)
    }

    fn parse_expression(type_name: &str) -> Result<Self, Eip712Error> {
        if let Some(stripped) = type_name.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(|| {
                Eip712Error::schema(type_name, "unbalanced array brackets")
            })?;
            let element = FieldType::parse_expression(&stripped[..open])?;
            let dimension = &stripped[open + 1..];
            let len = if dimension.is_empty() {
                None
            } else {
                Some(dimension.parse::<usize>().map_err(|_| {
                    Eip712Error::schema(type_name, format!("invalid array length `{}`", dimension))
                })?)
            };
            return Ok(FieldType::Array(Box::new(element), len));
        }

        match type_name {
            "address" => return Ok(FieldType::Address),
            "bool" => return Ok(FieldType::Bool),
            "string" => return Ok(FieldType::String),
            "bytes" => return Ok(FieldType::Bytes),
            _ => {}
        }

        if let Some(bits) = numeric_suffix(type_name, "uint") {
            return check_int_width(type_name, bits).map(FieldType::Uint);
        }
        if let Some(bits) = numeric_suffix(type_name, "int") {
            return check_int_width(type_name, bits).map(FieldType::Int);
        }
        if let Some(size) = numeric_suffix(type_name, "bytes") {
            if (1..=32).contains(&size) {
                return Ok(FieldType::FixedBytes(size as u8));
            }
            return Err(Eip712Error::schema(
                type_name,
                "fixed bytes width must be between 1 and 32",
            ));
        }

        if is_identifier(type_name) {
            Ok(FieldType::Struct(type_name.to_string()))
        } else {
            Err(Eip712Error::schema(type_name, "not a valid type expression"))
        }
    }

    /// The struct this type refers to, looking through arrays.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            FieldType::Array(element, _) => element.struct_name(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Address => write!(f, "address"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Uint(bits) => write!(f, "uint{}", bits),
            FieldType::Int(bits) => write!(f, "int{}", bits),
            FieldType::FixedBytes(size) => write!(f, "bytes{}", size),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::String => write!(f, "string"),
            FieldType::Struct(name) => write!(f, "{}", name),
            FieldType::Array(element, None) => write!(f, "{}[]", element),
            FieldType::Array(element, Some(len)) => write!(f, "{}[{}]", element, len),
        }
    }
}

/// `uint256` -> Some(256); `uint` -> None; `uintx` -> None
fn numeric_suffix(type_name: &str, prefix: &str) -> Option<u32> {
    let digits = type_name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().or(Some(u32::MAX))
}

fn check_int_width(type_name: &str, bits: u32) -> Result<u16, Eip712Error> {
    if bits > 0 && bits <= 256 && bits % 8 == 0 {
        Ok(bits as u16)
    } else {
        Err(Eip712Error::schema(
            type_name,
            "integer width must be a multiple of 8 between 8 and 256",
        ))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Builder for the standard EIP-712 domain fields
///
/// Emits the domain schema (present fields only, canonical order) together
/// with the matching domain values. Domains with non-standard fields are
/// written out as a schema plus a JSON object instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// The address of the contract that will verify the signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// Domain schema for the fields that are set
    pub fn fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }

    /// Domain values as a JSON object
    pub fn values(&self) -> serde_json::Value {
        // Only string and integer fields: serialization cannot fail.
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Complete EIP-712 typed data document (`eth_signTypedData_v3` payload)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields), including `EIP712Domain`
    pub types: TypeSchema,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// Domain values, matching the declared `EIP712Domain` fields
    pub domain: serde_json::Value,

    /// The actual message data to sign
    #[serde(default)]
    pub message: serde_json::Value,
}

impl TypedData {
    /// Assemble a document from a standard domain and a message schema.
    ///
    /// `types` must not already declare `EIP712Domain`; it is derived from `domain`.
    pub fn new(
        domain: &Eip712Domain,
        mut types: TypeSchema,
        primary_type: impl Into<String>,
        message: serde_json::Value,
    ) -> Self {
        types.insert(DOMAIN_TYPE_NAME.to_string(), domain.fields());
        Self {
            types,
            primary_type: primary_type.into(),
            domain: domain.values(),
            message,
        }
    }

    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// The declared `EIP712Domain` fields
    pub fn domain_fields(&self) -> Result<&[TypedDataField], Eip712Error> {
        self.types
            .get(DOMAIN_TYPE_NAME)
            .map(Vec::as_slice)
            .ok_or_else(|| Eip712Error::schema(DOMAIN_TYPE_NAME, "domain type is not declared"))
    }

    /// Validate the typed data structure
    ///
    /// Checks that the primary type and `EIP712Domain` are declared, that every
    /// type expression is well formed, that every referenced struct is declared
    /// and that no struct reaches itself through its fields.
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(Eip712Error::InvalidPrimaryType(self.primary_type.clone()));
        }
        self.domain_fields()?;
        super::encoder::validate_schema(&self.types)
    }
}

/// EIP-712 signature components
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct Eip712Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (27 or 28)
    pub v: u8,
}

impl Eip712Signature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from 65-byte signature (r || s || v)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() != 65 {
            return Err(Eip712Error::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = bytes[64];

        Ok(Self { r, s, v })
    }

    /// Parse a `0x`-prefixed (or bare) 130-digit hex signature
    pub fn from_hex(hex_str: &str) -> Result<Self, Eip712Error> {
        let bytes = hex::decode(strip_hex_prefix(hex_str.trim()))
            .map_err(|e| Eip712Error::InvalidSignature(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Recovery id (0 or 1); `v` may be stored as 0/1 or 27/28
    pub fn recovery_id(&self) -> Result<u8, Eip712Error> {
        match self.v {
            0 | 1 => Ok(self.v),
            27 | 28 => Ok(self.v - 27),
            v => Err(Eip712Error::InvalidSignature(format!(
                "invalid recovery id: v = {}",
                v
            ))),
        }
    }

    /// Convert to 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Schema error in `{type_name}`: {reason}")]
    Schema { type_name: String, reason: String },

    #[error("Invalid primary type: {0}")]
    InvalidPrimaryType(String),

    #[error("Value mismatch at `{path}`: expected {expected}, found {found}")]
    ValueMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Cannot encode `{path}` as {type_name}: {reason}")]
    Encoding {
        path: String,
        type_name: String,
        reason: String,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing error: {0}")]
    SigningError(String),
}

impl Eip712Error {
    pub fn schema(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Eip712Error::Schema {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        value: &serde_json::Value,
    ) -> Self {
        Eip712Error::ValueMismatch {
            path: path.into(),
            expected: expected.into(),
            found: json_kind(value).to_string(),
        }
    }

    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Eip712Error::ValueMismatch {
            path: path.into(),
            expected: expected.into(),
            found: "nothing".to_string(),
        }
    }

    pub fn encoding(
        path: impl Into<String>,
        type_name: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Eip712Error::Encoding {
            path: path.into(),
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error describes the schema rather than a value
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Eip712Error::Schema { .. } | Eip712Error::InvalidPrimaryType(_))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Strip a leading `0x`/`0X`
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_parse_elementary_types() {
        assert_eq!(FieldType::parse("address").unwrap(), FieldType::Address);
        assert_eq!(FieldType::parse("bool").unwrap(), FieldType::Bool);
        assert_eq!(FieldType::parse("uint256").unwrap(), FieldType::Uint(256));
        assert_eq!(FieldType::parse("uint8").unwrap(), FieldType::Uint(8));
        assert_eq!(FieldType::parse("int256").unwrap(), FieldType::Int(256));
        assert_eq!(FieldType::parse("bytes32").unwrap(), FieldType::FixedBytes(32));
        assert_eq!(FieldType::parse("bytes1").unwrap(), FieldType::FixedBytes(1));
        assert_eq!(FieldType::parse("bytes").unwrap(), FieldType::Bytes);
        assert_eq!(FieldType::parse("string").unwrap(), FieldType::String);
    }

    #[test]
    fn test_reject_bad_widths() {
        assert!(FieldType::parse("uint257").unwrap_err().is_schema_error());
        assert!(FieldType::parse("uint7").is_err());
        assert!(FieldType::parse("int0").is_err());
        assert!(FieldType::parse("bytes33").is_err());
        assert!(FieldType::parse("bytes0").is_err());
        assert!(FieldType::parse("uint99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_arrays_and_structs() {
        assert_eq!(
            FieldType::parse("Person[]").unwrap(),
            FieldType::Array(Box::new(FieldType::Struct("Person".into())), None)
        );
        let nested = FieldType::parse("uint256[][4]").unwrap();
        assert_eq!(
            nested,
            FieldType::Array(
                Box::new(FieldType::Array(Box::new(FieldType::Uint(256)), None)),
                Some(4)
            )
        );
        assert_eq!(nested.to_string(), "uint256[][4]");
        assert_eq!(FieldType::parse("Item[2]").unwrap().struct_name(), Some("Item"));
        // Bare `uint` is not canonical and is treated as a struct name
        assert_eq!(FieldType::parse("uint").unwrap(), FieldType::Struct("uint".into()));
        assert!(FieldType::parse("uint256[x]").is_err());
        assert!(FieldType::parse("Person]").is_err());
        assert!(FieldType::parse("").is_err());
    }

    #[test]
    fn test_domain_builder_fields() {
        let domain = Eip712Domain {
            name: Some("MultiSignatureWallet".into()),
            version: Some("1".into()),
            chain_id: Some(1),
            ..Default::default()
        };
        let names: Vec<_> = domain.fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "version", "chainId"]);
        assert_eq!(
            domain.values(),
            serde_json::json!({"name": "MultiSignatureWallet", "version": "1", "chainId": 1})
        );
    }

    #[test]
    fn test_signature_conversion() {
        let sig = Eip712Signature::new([1u8; 32], [2u8; 32], 27);
        let recovered = Eip712Signature::from_hex(&sig.to_hex()).unwrap();

        assert_eq!(sig, recovered);
        assert_eq!(recovered.recovery_id().unwrap(), 0);
        assert!(Eip712Signature::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_recovery_id_accepts_only_ecrecover_values() {
        for (v, id) in [(0u8, 0u8), (1, 1), (27, 0), (28, 1)] {
            assert_eq!(Eip712Signature::new([1u8; 32], [2u8; 32], v).recovery_id().unwrap(), id);
        }
        for v in [2u8, 3, 26, 29, 35] {
            assert!(matches!(
                Eip712Signature::new([1u8; 32], [2u8; 32], v).recovery_id(),
                Err(Eip712Error::InvalidSignature(_))
            ));
        }
    }

    #[test]
    fn test_parse_rejects_non_canonical_spelling() {
        assert!(FieldType::parse("uint256 ").unwrap_err().is_schema_error());
        assert!(FieldType::parse("uint0008").is_err());
        assert!(FieldType::parse("bytes32[04]").is_err());
        assert!(FieldType::parse("Person[ ]").is_err());
        assert!(FieldType::parse("uint8[2]").is_ok());
    }
}
