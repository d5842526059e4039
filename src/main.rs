use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ethers_core::types::U256;
use multisig_eip712::eip712::{
    get_pre_image, recover_address, strip_hex_prefix, type_hash, Eip712PreImage, Eip712Signature,
    LocalSigner, Signer, TypedData,
};
use multisig_eip712::message_signer::{self, MessageSignature};
use multisig_eip712::multisig::{self, Execute, ExecuteLayout};
use multisig_eip712::utils::logging;
use multisig_eip712::utils::service_config::{signer_key_from_env, SIGNER_KEY_ENV};
use multisig_eip712::{log_debug, log_info, MultisigError, MultisigResult};
use secrecy::ExposeSecret;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "multisig-eip712",
    version,
    about = "EIP-712 digests, signatures and storage keys for MultiSignatureWallet"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an eth_signTypedData_v3 JSON document
    Hash {
        /// Path to the document, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Hash a MultiSignatureWallet `Execute` call
    Execute {
        #[arg(long, value_parser = parse_u256)]
        nonce: U256,

        #[arg(long)]
        destination: String,

        #[arg(long, value_parser = parse_u256)]
        gas_limit: U256,

        /// Calldata as `0x` hex
        #[arg(long, default_value = "0x")]
        data: String,

        #[arg(long, default_value_t = 1)]
        chain_id: u64,

        /// The wallet contract; required by `contract-bound` and `domain-only`
        #[arg(long)]
        verifying_contract: Option<String>,

        /// typed | contract-bound | domain-only
        #[arg(long, default_value_t = ExecuteLayout::Typed)]
        layout: ExecuteLayout,

        #[arg(long)]
        json: bool,
    },

    /// Sign with the key in MULTISIG_SIGNER_KEY
    Sign {
        /// 32-byte digest, signed as is
        #[arg(long, required_unless_present = "message", conflicts_with = "message")]
        digest: Option<String>,

        /// Message signed with the personal_sign prefix; `0x` input is hex-decoded
        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Recover the signer of a digest or personal message
    Recover {
        #[arg(long, required_unless_present = "message", conflicts_with = "message")]
        digest: Option<String>,

        #[arg(long)]
        message: Option<String>,

        /// 65-byte `r || s || v` signature
        #[arg(long)]
        signature: String,

        /// Fail unless the recovered address matches
        #[arg(long)]
        expected: Option<String>,
    },

    /// Storage position of an address in the wallet's weight mapping
    StorageKey {
        address: String,

        /// Print the eth_getStorageAt request against this wallet instead
        #[arg(long)]
        wallet: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_from_env();
    if cli.verbose {
        logging::enable_debug();
    }

    match cli.command {
        Commands::Hash { input, json } => {
            let raw = read_input(&input)?;
            let typed_data = TypedData::from_json(&raw)
                .map_err(MultisigError::from)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            let report = hash_report(&typed_data)?;
            print_report(&report, json)?;
        }
        Commands::Execute {
            nonce,
            destination,
            gas_limit,
            data,
            chain_id,
            verifying_contract,
            layout,
            json,
        } => {
            let mut execute = Execute::new(nonce, &destination, gas_limit, &data)
                .map_err(MultisigError::from)?;
            if let Some(contract) = verifying_contract {
                execute = execute
                    .with_verifying_contract(&contract)
                    .map_err(MultisigError::from)?;
            }

            let typed_data = execute
                .typed_data(layout, chain_id)
                .map_err(MultisigError::from)?;
            let report = hash_report(&typed_data)?;
            print_report(&report, json)?;
        }
        Commands::Sign {
            digest,
            message,
            json,
        } => {
            let signer = load_signer()?;
            let signature = match (digest, message) {
                (Some(digest), _) => {
                    let digest = parse_digest(&digest)?;
                    MessageSignature::from(&signer.sign_digest(&digest).map_err(MultisigError::from)?)
                }
                (None, Some(message)) => {
                    let bytes = message_signer::message_bytes(&message).map_err(MultisigError::from)?;
                    message_signer::personal_sign(&bytes, &signer).map_err(MultisigError::from)?
                }
                (None, None) => bail!("either --digest or --message is required"),
            };

            log_info!("cli", "signed", signer = signer.address());

            if json {
                let mut value = serde_json::to_value(&signature)?;
                value["address"] = json!(signer.address());
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("ADDRESS   {}", signer.address());
                println!("SIGNATURE {}", signature.signature);
            }
        }
        Commands::Recover {
            digest,
            message,
            signature,
            expected,
        } => {
            let signature = Eip712Signature::from_hex(&signature).map_err(MultisigError::from)?;
            let recovered = match (digest, message) {
                (Some(digest), _) => {
                    recover_address(&parse_digest(&digest)?, &signature).map_err(MultisigError::from)?
                }
                (None, Some(message)) => {
                    let bytes = message_signer::message_bytes(&message).map_err(MultisigError::from)?;
                    message_signer::recover_personal_sign(&bytes, &signature.to_bytes())
                        .map_err(MultisigError::from)?
                }
                (None, None) => bail!("either --digest or --message is required"),
            };

            println!("{}", recovered);

            if let Some(expected) = expected {
                if !strip_hex_prefix(&recovered).eq_ignore_ascii_case(strip_hex_prefix(expected.trim())) {
                    bail!("recovered {} but expected {}", recovered, expected);
                }
            }
        }
        Commands::StorageKey { address, wallet } => match wallet {
            Some(wallet) => {
                let request = multisig::get_storage_at_request(&wallet, &address, 1)
                    .map_err(MultisigError::from)?;
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
            None => {
                println!(
                    "{}",
                    multisig::storage_key_hex(&address).map_err(MultisigError::from)?
                );
            }
        },
    }

    Ok(())
}

struct HashReport {
    type_hash: [u8; 32],
    pre_image: Eip712PreImage,
}

fn hash_report(typed_data: &TypedData) -> MultisigResult<HashReport> {
    let pre_image = get_pre_image(typed_data)?;
    let type_hash = type_hash(&typed_data.primary_type, &typed_data.types)?;

    log_debug!(
        "cli",
        "hashed typed data",
        primary_type = typed_data.primary_type,
        digest = hex0x(&pre_image.digest),
    );

    Ok(HashReport {
        type_hash,
        pre_image,
    })
}

fn print_report(report: &HashReport, as_json: bool) -> Result<()> {
    let struct_hash = report.pre_image.struct_hash.as_ref().map(|h| hex0x(h));

    if as_json {
        let value = json!({
            "typeHash": hex0x(&report.type_hash),
            "domainSeparator": hex0x(&report.pre_image.domain_separator),
            "structHash": struct_hash,
            "digest": hex0x(&report.pre_image.digest),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("TYPE HASH        {}", hex0x(&report.type_hash));
        println!("DOMAIN SEPARATOR {}", hex0x(&report.pre_image.domain_separator));
        println!("STRUCT HASH      {}", struct_hash.as_deref().unwrap_or("-"));
        println!("DIGEST           {}", hex0x(&report.pre_image.digest));
    }

    Ok(())
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn load_signer() -> Result<LocalSigner> {
    let key = match signer_key_from_env() {
        Some(key) => key,
        None => bail!("{} is not set", SIGNER_KEY_ENV),
    };
    LocalSigner::from_hex(key.expose_secret())
        .map_err(|e| MultisigError::new(multisig_eip712::ErrorCode::InvalidPrivateKey, e.to_string()))
        .with_context(|| format!("{} is not a valid private key", SIGNER_KEY_ENV))
}

fn parse_digest(raw: &str) -> MultisigResult<[u8; 32]> {
    let bytes = hex::decode(strip_hex_prefix(raw.trim()))?;
    bytes.as_slice().try_into().map_err(|_| {
        MultisigError::invalid_input("digest must be 32 bytes")
            .with_details(format!("got {} bytes", bytes.len()))
    })
}

fn parse_u256(raw: &str) -> Result<U256, String> {
    let raw = raw.trim();
    if raw.starts_with("0x") || raw.starts_with("0X") {
        U256::from_str_radix(strip_hex_prefix(raw), 16).map_err(|e| format!("{:?}", e))
    } else {
        U256::from_dec_str(raw).map_err(|e| e.to_string())
    }
}

fn hex0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
