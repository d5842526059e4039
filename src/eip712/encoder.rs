//! EIP-712 Type Encoding
//!
//! Implements the encoding rules for EIP-712 typed data: `encodeType`,
//! `typeHash`, `encodeData` and the per-field `encodeValue` words.

use super::types::*;
use ethers_core::types::{I256, U256};
use std::collections::{BTreeSet, HashMap, HashSet};
use tiny_keccak::{Hasher, Keccak};

/// Encode a type string for a struct type
///
/// Format: `TypeName(type1 name1,type2 name2,...)` followed by every struct
/// it references, directly or through other structs, sorted by name.
pub fn encode_type(type_name: &str, types: &TypeSchema) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::schema(type_name, "type is not declared"))?;

    let dependencies = find_type_dependencies(type_name, types)?;

    let mut result = format_type_string(type_name, fields);

    // BTreeSet iterates in sorted order
    for dep in dependencies.iter().filter(|dep| dep.as_str() != type_name) {
        if let Some(dep_fields) = types.get(dep) {
            result.push_str(&format_type_string(dep, dep_fields));
        }
    }

    Ok(result)
}

/// Format a single type string
fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Find all struct types reachable from `type_name`, including itself
///
/// Fails on undeclared or malformed field types and on reference cycles.
pub fn find_type_dependencies(
    type_name: &str,
    types: &TypeSchema,
) -> Result<BTreeSet<String>, Eip712Error> {
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut found = BTreeSet::new();

    visit(type_name, types, &mut marks, &mut stack, &mut found)?;

    Ok(found)
}

fn visit<'a>(
    type_name: &'a str,
    types: &'a TypeSchema,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    found: &mut BTreeSet<String>,
) -> Result<(), Eip712Error> {
    match marks.get(type_name) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|s| *s == type_name).unwrap_or(0);
            let mut cycle: Vec<&str> = stack[start..].to_vec();
            cycle.push(type_name);
            return Err(Eip712Error::schema(
                type_name,
                format!("recursive type reference: {}", cycle.join(" -> ")),
            ));
        }
        None => {}
    }

    let (name, fields) = types
        .get_key_value(type_name)
        .ok_or_else(|| Eip712Error::schema(type_name, "type is not declared"))?;

    marks.insert(name.as_str(), Mark::Visiting);
    stack.push(name.as_str());

    let mut field_names = HashSet::with_capacity(fields.len());
    for field in fields {
        if !field_names.insert(field.name.as_str()) {
            return Err(Eip712Error::schema(
                name.as_str(),
                format!("duplicate field `{}`", field.name),
            ));
        }
        let field_type = FieldType::parse(&field.type_name)?;
        if let Some(dep) = field_type.struct_name() {
            let (dep_name, _) = types.get_key_value(dep).ok_or_else(|| {
                Eip712Error::schema(
                    dep,
                    format!("referenced by `{}.{}` but not declared", name, field.name),
                )
            })?;
            visit(dep_name.as_str(), types, marks, stack, found)?;
        }
    }

    stack.pop();
    marks.insert(name.as_str(), Mark::Visited);
    found.insert(name.clone());

    Ok(())
}

/// Check every declared type: field types parse, references resolve, no cycles.
pub fn validate_schema(types: &TypeSchema) -> Result<(), Eip712Error> {
    // Sorted so the reported error does not depend on hash map order
    let mut names: Vec<&String> = types.keys().collect();
    names.sort();

    for name in names {
        find_type_dependencies(name, types)?;
    }
    Ok(())
}

/// Calculate the type hash for a struct type
/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &TypeSchema) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// Encode `typeHash || enc(field1) || enc(field2) || ...` for one struct value
///
/// `path` names the value in error messages (e.g. `Mail.from`).
pub fn encode_data(
    type_name: &str,
    value: &serde_json::Value,
    types: &TypeSchema,
    path: &str,
) -> Result<Vec<u8>, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::schema(type_name, "type is not declared"))?;

    let obj = value
        .as_object()
        .ok_or_else(|| Eip712Error::mismatch(path, format!("a `{}` object", type_name), value))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        let field_value = obj
            .get(&field.name)
            .ok_or_else(|| Eip712Error::missing(&field_path, field.type_name.as_str()))?;

        let field_type = FieldType::parse(&field.type_name)?;
        encoded.extend_from_slice(&encode_field(&field_type, field_value, types, &field_path)?);
    }

    Ok(encoded)
}

/// Encode a value according to its type expression, as one 32-byte word
///
/// Structs encode to their struct hash, `string`/`bytes` and arrays to the
/// hash of their contents, elementary types to their ABI word.
pub fn encode_value(
    type_name: &str,
    value: &serde_json::Value,
    types: &TypeSchema,
) -> Result<[u8; 32], Eip712Error> {
    let field_type = FieldType::parse(type_name)?;
    encode_field(&field_type, value, types, type_name)
}

pub(crate) fn encode_field(
    field_type: &FieldType,
    value: &serde_json::Value,
    types: &TypeSchema,
    path: &str,
) -> Result<[u8; 32], Eip712Error> {
    match field_type {
        FieldType::Array(element, len) => {
            encode_array(field_type, element, *len, value, types, path)
        }
        FieldType::Struct(name) => {
            if !types.contains_key(name) {
                return Err(Eip712Error::schema(
                    name.as_str(),
                    format!("referenced at `{}` but not declared", path),
                ));
            }
            Ok(keccak256(&encode_data(name, value, types, path)?))
        }
        FieldType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| Eip712Error::mismatch(path, "a string", value))?;
            Ok(keccak256(s.as_bytes()))
        }
        FieldType::Bytes => {
            let hex_str = value
                .as_str()
                .ok_or_else(|| Eip712Error::mismatch(path, "a hex string", value))?;
            let bytes = parse_hex(hex_str, path, field_type)?;
            Ok(keccak256(&bytes))
        }
        _ => encode_atomic(field_type, value, path),
    }
}

/// Encode an array value
fn encode_array(
    field_type: &FieldType,
    element: &FieldType,
    len: Option<usize>,
    value: &serde_json::Value,
    types: &TypeSchema,
    path: &str,
) -> Result<[u8; 32], Eip712Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Eip712Error::mismatch(path, format!("an array for `{}`", field_type), value))?;

    if let Some(expected) = len {
        if items.len() != expected {
            return Err(Eip712Error::ValueMismatch {
                path: path.to_string(),
                expected: format!("{} elements", expected),
                found: format!("{} elements", items.len()),
            });
        }
    }

    let mut encoded = Vec::with_capacity(32 * items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}[{}]", path, i);
        encoded.extend_from_slice(&encode_field(element, item, types, &item_path)?);
    }

    Ok(keccak256(&encoded))
}

/// Encode an atomic (fixed-size) value
fn encode_atomic(
    field_type: &FieldType,
    value: &serde_json::Value,
    path: &str,
) -> Result<[u8; 32], Eip712Error> {
    let mut result = [0u8; 32];

    match field_type {
        // address - 20 bytes, left-padded to 32
        FieldType::Address => {
            let addr = value
                .as_str()
                .ok_or_else(|| Eip712Error::mismatch(path, "an address string", value))?;
            let addr_bytes = parse_address(addr, path)?;
            result[12..].copy_from_slice(&addr_bytes);
        }
        FieldType::Bool => {
            let b = value
                .as_bool()
                .ok_or_else(|| Eip712Error::mismatch(path, "a boolean", value))?;
            result[31] = u8::from(b);
        }
        FieldType::Uint(bits) => {
            let n = parse_uint(value, path, field_type)?;
            if n.bits() > usize::from(*bits) {
                return Err(Eip712Error::encoding(
                    path,
                    field_type,
                    format!("{} does not fit in {} bits", n, bits),
                ));
            }
            n.to_big_endian(&mut result);
        }
        FieldType::Int(bits) => {
            let n = parse_int(value, path, field_type)?;
            if !int_fits(n, *bits) {
                return Err(Eip712Error::encoding(
                    path,
                    field_type,
                    format!("{} does not fit in {} bits", n, bits),
                ));
            }
            // Two's complement, already sign-extended to 256 bits
            n.into_raw().to_big_endian(&mut result);
        }
        // bytesN - right-padded
        FieldType::FixedBytes(size) => {
            let hex_str = value
                .as_str()
                .ok_or_else(|| Eip712Error::mismatch(path, "a hex string", value))?;
            let bytes = parse_hex(hex_str, path, field_type)?;
            if bytes.len() > usize::from(*size) {
                return Err(Eip712Error::encoding(
                    path,
                    field_type,
                    format!("{} bytes is longer than {}", bytes.len(), size),
                ));
            }
            result[..bytes.len()].copy_from_slice(&bytes);
        }
        other => {
            return Err(Eip712Error::schema(
                other.to_string(),
                "not an atomic type",
            ))
        }
    }

    Ok(result)
}

fn int_fits(n: I256, bits: u16) -> bool {
    if bits >= 256 {
        return true;
    }
    let limit = U256::one() << (usize::from(bits) - 1);
    if n.is_negative() {
        n.unsigned_abs() <= limit
    } else {
        n.unsigned_abs() < limit
    }
}

/// Parse an Ethereum address (any case, with or without `0x`)
pub fn parse_address(addr: &str, path: &str) -> Result<[u8; 20], Eip712Error> {
    let addr = strip_hex_prefix(addr.trim());

    if addr.len() != 40 {
        return Err(Eip712Error::encoding(
            path,
            "address",
            format!("expected 40 hex chars, got {}", addr.len()),
        ));
    }

    let bytes = hex::decode(addr)
        .map_err(|e| Eip712Error::encoding(path, "address", format!("invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Parse a uint value (decimal string, hex string, or JSON integer)
fn parse_uint(
    value: &serde_json::Value,
    path: &str,
    field_type: &FieldType,
) -> Result<U256, Eip712Error> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(U256::from(u));
            }
            if n.is_i64() {
                return Err(Eip712Error::encoding(path, field_type, "negative value"));
            }
            Err(Eip712Error::encoding(
                path,
                field_type,
                format!("{} is not an exact integer; pass large values as strings", n),
            ))
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.starts_with('-') {
                return Err(Eip712Error::encoding(path, field_type, "negative value"));
            }
            if s.starts_with("0x") || s.starts_with("0X") {
                let digits = strip_hex_prefix(s);
                if digits.is_empty() {
                    return Err(Eip712Error::encoding(path, field_type, "empty hex number"));
                }
                U256::from_str_radix(digits, 16).map_err(|e| {
                    Eip712Error::encoding(path, field_type, format!("invalid hex number: {:?}", e))
                })
            } else {
                U256::from_dec_str(s).map_err(|e| {
                    Eip712Error::encoding(path, field_type, format!("invalid number `{}`: {:?}", s, e))
                })
            }
        }
        _ => Err(Eip712Error::mismatch(path, "a number or numeric string", value)),
    }
}

/// Parse a signed int value; hex strings are read as a signed magnitude
fn parse_int(
    value: &serde_json::Value,
    path: &str,
    field_type: &FieldType,
) -> Result<I256, Eip712Error> {
    let text = match value {
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        serde_json::Value::Number(n) => {
            return Err(Eip712Error::encoding(
                path,
                field_type,
                format!("{} is not an exact integer; pass large values as strings", n),
            ))
        }
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(Eip712Error::mismatch(path, "a number or numeric string", value)),
    };

    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };

    let parsed = if magnitude.starts_with("0x") || magnitude.starts_with("0X") {
        let digits = strip_hex_prefix(magnitude);
        if digits.is_empty() {
            return Err(Eip712Error::encoding(path, field_type, "empty hex number"));
        }
        let signed = if negative { format!("-{}", digits) } else { digits.to_string() };
        I256::from_hex_str(&signed)
    } else {
        I256::from_dec_str(&text)
    };

    parsed.map_err(|e| {
        Eip712Error::encoding(path, field_type, format!("invalid number `{}`: {}", text, e))
    })
}

/// Parse a hex string (with or without 0x prefix); `0x` is the empty byte string
fn parse_hex(s: &str, path: &str, field_type: &FieldType) -> Result<Vec<u8>, Eip712Error> {
    hex::decode(strip_hex_prefix(s.trim()))
        .map_err(|e| Eip712Error::encoding(path, field_type, format!("invalid hex: {}", e)))
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
