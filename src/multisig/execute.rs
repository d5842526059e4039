//! The `Execute` payload and its signing layouts
//!
//! The same execute call has been signed in three shapes over the wallet's
//! history. They differ only in schema, so each layout is a schema plus a
//! value mapping over one [`Execute`].

use crate::eip712::{
    get_pre_image, parse_address, strip_hex_prefix, Eip712Domain, Eip712Error, Eip712PreImage,
    TypeSchema, TypedData, TypedDataField, DOMAIN_TYPE_NAME,
};
use crate::log_debug;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Domain name the wallet signs under
pub const WALLET_NAME: &str = "MultiSignatureWallet";
/// Domain version the wallet signs under
pub const WALLET_VERSION: &str = "1";

const EXECUTE_TYPE_NAME: &str = "Execute";

lazy_static::lazy_static! {
    static ref EXECUTE_FIELDS: Vec<TypedDataField> = vec![
        TypedDataField::new("nonce", "uint256"),
        TypedDataField::new("destination", "address"),
        TypedDataField::new("gasLimit", "uint256"),
        TypedDataField::new("data", "bytes"),
    ];

    static ref CONTRACT_BOUND_EXECUTE_FIELDS: Vec<TypedDataField> = {
        let mut fields = vec![TypedDataField::new("verifyingContract", "address")];
        fields.extend(EXECUTE_FIELDS.iter().cloned());
        fields
    };

    static ref DOMAIN_ONLY_FIELDS: Vec<TypedDataField> = {
        let mut fields = vec![
            TypedDataField::new("chainId", "uint256"),
            TypedDataField::new("verifyingContract", "address"),
        ];
        fields.extend(EXECUTE_FIELDS.iter().cloned());
        fields
    };
}

/// How an [`Execute`] is laid out as typed data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecuteLayout {
    /// `Execute(uint256 nonce,address destination,uint256 gasLimit,bytes data)`
    /// under the named wallet domain. What the wallet UI signs.
    #[default]
    Typed,
    /// `Execute(address verifyingContract,...)` under the named wallet domain
    ContractBound,
    /// Every field folded into `EIP712Domain`; the digest covers the domain only
    DomainOnly,
}

impl ExecuteLayout {
    pub const ALL: [ExecuteLayout; 3] = [
        ExecuteLayout::Typed,
        ExecuteLayout::ContractBound,
        ExecuteLayout::DomainOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecuteLayout::Typed => "typed",
            ExecuteLayout::ContractBound => "contract-bound",
            ExecuteLayout::DomainOnly => "domain-only",
        }
    }

    /// Whether the layout hashes the wallet's own address
    pub fn requires_verifying_contract(&self) -> bool {
        !matches!(self, ExecuteLayout::Typed)
    }
}

impl fmt::Display for ExecuteLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecuteLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecuteLayout::ALL
            .into_iter()
            .find(|layout| layout.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown layout `{}` (expected one of: typed, contract-bound, domain-only)",
                    s
                )
            })
    }
}

/// One call the wallet is asked to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    pub nonce: U256,
    pub destination: [u8; 20],
    pub gas_limit: U256,
    pub data: Vec<u8>,
    /// The wallet contract itself; needed by every layout but [`ExecuteLayout::Typed`]
    pub verifying_contract: Option<[u8; 20]>,
}

impl Execute {
    /// Build from user-facing strings: a `0x` address and `0x` calldata
    pub fn new(
        nonce: impl Into<U256>,
        destination: &str,
        gas_limit: impl Into<U256>,
        data: &str,
    ) -> Result<Self, Eip712Error> {
        let data = hex::decode(strip_hex_prefix(data.trim()))
            .map_err(|e| Eip712Error::encoding("Execute.data", "bytes", format!("invalid hex: {}", e)))?;

        Ok(Self {
            nonce: nonce.into(),
            destination: parse_address(destination, "Execute.destination")?,
            gas_limit: gas_limit.into(),
            data,
            verifying_contract: None,
        })
    }

    /// Bind the payload to a wallet contract
    pub fn with_verifying_contract(mut self, contract: &str) -> Result<Self, Eip712Error> {
        self.verifying_contract = Some(parse_address(contract, "Execute.verifyingContract")?);
        Ok(self)
    }

    /// The typed data document for `layout` on `chain_id`
    pub fn typed_data(&self, layout: ExecuteLayout, chain_id: u64) -> Result<TypedData, Eip712Error> {
        let mut message = json!({
            "nonce": self.nonce.to_string(),
            "destination": hex_address(&self.destination),
            "gasLimit": self.gas_limit.to_string(),
            "data": format!("0x{}", hex::encode(&self.data)),
        });

        match layout {
            ExecuteLayout::Typed => {
                let mut types = TypeSchema::new();
                types.insert(EXECUTE_TYPE_NAME.to_string(), EXECUTE_FIELDS.clone());
                Ok(TypedData::new(&wallet_domain(chain_id), types, EXECUTE_TYPE_NAME, message))
            }
            ExecuteLayout::ContractBound => {
                let contract = self.require_verifying_contract(EXECUTE_TYPE_NAME)?;
                message["verifyingContract"] = json!(hex_address(&contract));

                let mut types = TypeSchema::new();
                types.insert(
                    EXECUTE_TYPE_NAME.to_string(),
                    CONTRACT_BOUND_EXECUTE_FIELDS.clone(),
                );
                Ok(TypedData::new(&wallet_domain(chain_id), types, EXECUTE_TYPE_NAME, message))
            }
            ExecuteLayout::DomainOnly => {
                let contract = self.require_verifying_contract(DOMAIN_TYPE_NAME)?;
                message["chainId"] = json!(chain_id);
                message["verifyingContract"] = json!(hex_address(&contract));

                let mut types = HashMap::with_capacity(1);
                types.insert(DOMAIN_TYPE_NAME.to_string(), DOMAIN_ONLY_FIELDS.clone());

                Ok(TypedData {
                    types,
                    primary_type: DOMAIN_TYPE_NAME.to_string(),
                    domain: message,
                    message: json!({}),
                })
            }
        }
    }

    /// Every intermediate hash for `layout` on `chain_id`
    pub fn pre_image(&self, layout: ExecuteLayout, chain_id: u64) -> Result<Eip712PreImage, Eip712Error> {
        let typed_data = self.typed_data(layout, chain_id)?;
        let pre_image = get_pre_image(&typed_data)?;

        log_debug!(
            "multisig",
            "built execute digest",
            layout = layout,
            chain_id = chain_id,
            nonce = self.nonce,
            destination = hex_address(&self.destination),
            digest = hex::encode(pre_image.digest),
        );

        Ok(pre_image)
    }

    /// The digest a wallet signer signs for `layout` on `chain_id`
    pub fn digest(&self, layout: ExecuteLayout, chain_id: u64) -> Result<[u8; 32], Eip712Error> {
        self.pre_image(layout, chain_id).map(|p| p.digest)
    }

    fn require_verifying_contract(&self, owner: &str) -> Result<[u8; 20], Eip712Error> {
        self.verifying_contract
            .ok_or_else(|| Eip712Error::missing(format!("{}.verifyingContract", owner), "address"))
    }
}

fn wallet_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain {
        name: Some(WALLET_NAME.to_string()),
        version: Some(WALLET_VERSION.to_string()),
        chain_id: Some(chain_id),
        ..Default::default()
    }
}

fn hex_address(address: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xb49042552525a5336b1719ae9a11b0bb339cd195";

    fn release_execute() -> Execute {
        Execute::new(0u64, "0x2b47f0d926a28adfc90a69939502dcb687ac3686", 3_000_000u64, "0x87654321")
            .unwrap()
            .with_verifying_contract(WALLET)
            .unwrap()
    }

    #[test]
    fn test_typed_layout_digest() {
        let execute = Execute::new(
            0u64,
            "0x9dd1e8169e76a9226b07ab9f85cc20a5e1ed44dd",
            600_000u64,
            "0x654321",
        )
        .unwrap();

        assert_eq!(
            hex::encode(execute.digest(ExecuteLayout::Typed, 1).unwrap()),
            "ce3199312fdf33d7e39cc142cd06bfc4f3e6293f3e21a8ba76245194f7a2c800"
        );
    }

    #[test]
    fn test_contract_bound_layout() {
        let execute = release_execute();
        let typed_data = execute.typed_data(ExecuteLayout::ContractBound, 1).unwrap();

        assert_eq!(
            crate::eip712::encode_type("Execute", &typed_data.types).unwrap(),
            "Execute(address verifyingContract,uint256 nonce,address destination,uint256 gasLimit,bytes data)"
        );

        let pre_image = execute.pre_image(ExecuteLayout::ContractBound, 1).unwrap();
        assert_eq!(
            hex::encode(pre_image.domain_separator),
            "b0609d81c5f719d8a516ae2f25079b20fb63da3e07590e23fbf0028e6745e5f2"
        );
        assert_eq!(
            hex::encode(pre_image.struct_hash.unwrap()),
            "0864ded26f4edf0ae280bc1918728b011555f163b7ec73745facb3b9f8b2c538"
        );
        assert_eq!(
            hex::encode(pre_image.digest),
            "b5b80afedb187dccfcb437d761174e7b6c7c15b2e4617986d5dcc0433b14bede"
        );
    }

    #[test]
    fn test_domain_only_layout() {
        let pre_image = release_execute().pre_image(ExecuteLayout::DomainOnly, 1).unwrap();

        assert_eq!(pre_image.struct_hash, None);
        assert_eq!(
            hex::encode(pre_image.domain_separator),
            "c349231b89c1f072ab8f45dd5a9ba9c20833932a41322cc3b59ad72a2ca5c1c0"
        );
        assert_eq!(
            hex::encode(pre_image.digest),
            "abac8a03596a56b398350dc52592e83e6ba18bd5df772762858012621b061878"
        );
    }

    #[test]
    fn test_layouts_need_verifying_contract() {
        let execute = Execute::new(1u64, WALLET, 21_000u64, "0x").unwrap();

        assert!(execute.digest(ExecuteLayout::Typed, 1).is_ok());
        assert_eq!(
            execute.digest(ExecuteLayout::ContractBound, 1).unwrap_err(),
            Eip712Error::missing("Execute.verifyingContract", "address")
        );
        assert_eq!(
            execute.digest(ExecuteLayout::DomainOnly, 1).unwrap_err(),
            Eip712Error::missing("EIP712Domain.verifyingContract", "address")
        );
    }

    #[test]
    fn test_chain_id_changes_digest() {
        let execute = release_execute();
        for layout in ExecuteLayout::ALL {
            assert_ne!(
                execute.digest(layout, 1).unwrap(),
                execute.digest(layout, 3).unwrap(),
                "{}",
                layout
            );
        }
    }

    #[test]
    fn test_layout_parsing() {
        for layout in ExecuteLayout::ALL {
            assert_eq!(layout.as_str().parse::<ExecuteLayout>().unwrap(), layout);
        }
        assert!("eip712".parse::<ExecuteLayout>().is_err());
        assert_eq!(ExecuteLayout::default(), ExecuteLayout::Typed);
    }

    #[test]
    fn test_bad_inputs_carry_paths() {
        assert!(matches!(
            Execute::new(0u64, "0x1234", 0u64, "0x"),
            Err(Eip712Error::Encoding { ref path, .. }) if path == "Execute.destination"
        ));
        assert!(matches!(
            Execute::new(0u64, WALLET, 0u64, "0x123"),
            Err(Eip712Error::Encoding { ref path, .. }) if path == "Execute.data"
        ));
    }
}
