use serde_json::Value;
use std::process::Command;

const SIGNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SIGNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const DESTINATION: &str = "0x9dd1e8169e76a9226b07ab9f85cc20a5e1ed44dd";
const WALLET: &str = "0xb49042552525a5336b1719ae9a11b0bb339cd195";

fn cli() -> Command {
    let binary_path = assert_cmd::cargo::cargo_bin!("multisig-eip712");
    let mut command = Command::new(binary_path);
    command.env_remove("MULTISIG_SIGNER_KEY");
    command.env_remove("MULTISIG_LOG_DEBUG");
    command
}

fn run_ok(command: &mut Command) -> String {
    let output = command.output().expect("cli run succeeds");
    assert!(
        output.status.success(),
        "cli exited unsuccessfully: {:?}",
        output
    );
    String::from_utf8(output.stdout).expect("stdout is utf8")
}

fn execute_args() -> Vec<&'static str> {
    vec![
        "execute",
        "--nonce",
        "0",
        "--destination",
        DESTINATION,
        "--gas-limit",
        "600000",
        "--data",
        "0x654321",
    ]
}

#[test]
fn execute_prints_wallet_digest() {
    let stdout = run_ok(cli().args(execute_args()));

    assert!(stdout.contains(
        "TYPE HASH        0x4a0a6d86122c7bd7083e83912c312adabf207e986f1ac10a35dfeb610d28d0b6"
    ));
    assert!(stdout.contains(
        "DOMAIN SEPARATOR 0xb0609d81c5f719d8a516ae2f25079b20fb63da3e07590e23fbf0028e6745e5f2"
    ));
    assert!(stdout.contains(
        "STRUCT HASH      0x7ad891f0e4c05d8307d759fecab427f2ce772540e3708041827d974547814377"
    ));
    assert!(stdout.contains(
        "DIGEST           0xce3199312fdf33d7e39cc142cd06bfc4f3e6293f3e21a8ba76245194f7a2c800"
    ));
}

#[test]
fn execute_json_output() {
    let mut args = execute_args();
    args.push("--json");
    args[6] = "0x927c0";
    let stdout = run_ok(cli().args(args));

    let report: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(
        report["digest"],
        "0xce3199312fdf33d7e39cc142cd06bfc4f3e6293f3e21a8ba76245194f7a2c800"
    );
    assert_eq!(
        report["structHash"],
        "0x7ad891f0e4c05d8307d759fecab427f2ce772540e3708041827d974547814377"
    );
}

#[test]
fn execute_domain_only_layout() {
    let stdout = run_ok(cli().args([
        "execute",
        "--nonce",
        "0",
        "--destination",
        "0x2b47f0d926a28adfc90a69939502dcb687ac3686",
        "--gas-limit",
        "3000000",
        "--data",
        "0x87654321",
        "--verifying-contract",
        WALLET,
        "--layout",
        "domain-only",
        "--json",
    ]));

    let report: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert!(report["structHash"].is_null());
    assert_eq!(
        report["digest"],
        "0xabac8a03596a56b398350dc52592e83e6ba18bd5df772762858012621b061878"
    );
}

#[test]
fn execute_without_contract_fails_for_bound_layout() {
    let mut args = execute_args();
    args.extend(["--layout", "contract-bound"]);
    let output = cli().args(args).output().expect("cli runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Execute.verifyingContract"), "{}", stderr);
}

#[test]
fn hash_reads_document_from_stdin() {
    let document = serde_json::json!({
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"}
            ],
            "Execute": [
                {"name": "nonce", "type": "uint256"},
                {"name": "destination", "type": "address"},
                {"name": "gasLimit", "type": "uint256"},
                {"name": "data", "type": "bytes"}
            ]
        },
        "primaryType": "Execute",
        "domain": {"name": "MultiSignatureWallet", "version": "1", "chainId": 1},
        "message": {
            "nonce": 0,
            "destination": DESTINATION,
            "gasLimit": 600000,
            "data": "0x654321"
        }
    });

    let binary_path = assert_cmd::cargo::cargo_bin!("multisig-eip712");
    let assert = assert_cmd::Command::new(binary_path)
        .args(["hash", "-", "--json"])
        .write_stdin(document.to_string())
        .assert()
        .success();

    let report: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout is valid json");
    assert_eq!(
        report["digest"],
        "0xce3199312fdf33d7e39cc142cd06bfc4f3e6293f3e21a8ba76245194f7a2c800"
    );
}

#[test]
fn hash_reports_missing_field_path() {
    let path = std::env::temp_dir().join(format!("multisig-eip712-{}.json", std::process::id()));
    let document = r#"{
        "types": {
            "EIP712Domain": [{"name": "chainId", "type": "uint256"}],
            "Execute": [
                {"name": "nonce", "type": "uint256"},
                {"name": "destination", "type": "address"}
            ]
        },
        "primaryType": "Execute",
        "domain": {"chainId": 1},
        "message": {"nonce": 0}
    }"#;
    std::fs::write(&path, document).expect("write temp document");

    let output = cli().arg("hash").arg(&path).output().expect("cli runs");
    let _ = std::fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Execute.destination"), "{}", stderr);
}

#[test]
fn sign_then_recover_digest() {
    let digest = "0xce3199312fdf33d7e39cc142cd06bfc4f3e6293f3e21a8ba76245194f7a2c800";

    let stdout = run_ok(
        cli()
            .env("MULTISIG_SIGNER_KEY", SIGNER_KEY)
            .args(["sign", "--digest", digest, "--json"]),
    );
    let signed: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(signed["address"], SIGNER_ADDRESS);
    assert!(!stdout.contains(SIGNER_KEY));

    let signature = signed["signature"].as_str().expect("signature string");
    let expected = SIGNER_ADDRESS.to_lowercase();
    let recovered = run_ok(cli().args([
        "recover",
        "--digest",
        digest,
        "--signature",
        signature,
        "--expected",
        expected.as_str(),
    ]));
    assert_eq!(recovered.trim(), SIGNER_ADDRESS);

    let mismatch = cli()
        .args([
            "recover",
            "--digest",
            digest,
            "--signature",
            signature,
            "--expected",
            DESTINATION,
        ])
        .output()
        .expect("cli runs");
    assert!(!mismatch.status.success());
}

#[test]
fn sign_then_recover_personal_message() {
    let stdout = run_ok(
        cli()
            .env("MULTISIG_SIGNER_KEY", SIGNER_KEY)
            .args(["sign", "--message", "Hello, Ethereum!", "--json"]),
    );
    let signed: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    let signature = signed["signature"].as_str().expect("signature string");

    let recovered = run_ok(cli().args([
        "recover",
        "--message",
        "Hello, Ethereum!",
        "--signature",
        signature,
    ]));
    assert_eq!(recovered.trim(), SIGNER_ADDRESS);
}

#[test]
fn hex_message_is_decoded_before_signing() {
    let sign = |message: &str| {
        run_ok(
            cli()
                .env("MULTISIG_SIGNER_KEY", SIGNER_KEY)
                .args(["sign", "--message", message]),
        )
    };
    let from_hex = sign("0x48656c6c6f");
    assert_eq!(from_hex, sign("Hello"));

    let signature = from_hex
        .lines()
        .find_map(|line| line.strip_prefix("SIGNATURE "))
        .expect("signature line")
        .trim()
        .to_string();

    for message in ["0x48656c6c6f", "Hello"] {
        let recovered = run_ok(cli().args([
            "recover",
            "--message",
            message,
            "--signature",
            signature.as_str(),
        ]));
        assert_eq!(recovered.trim(), SIGNER_ADDRESS);
    }
}

#[test]
fn sign_requires_key() {
    let output = cli()
        .args(["sign", "--digest", "0x00"])
        .output()
        .expect("cli runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MULTISIG_SIGNER_KEY"), "{}", stderr);
}

#[test]
fn storage_key_pads_address() {
    let stdout = run_ok(cli().args(["storage-key", "0xf498406A8489385601bFb12B09b55B6855e545ff"]));
    assert_eq!(
        stdout.trim(),
        "0x000000000000000000000000f498406a8489385601bfb12b09b55b6855e545ff"
    );

    let stdout = run_ok(cli().args(["storage-key", WALLET, "--wallet", WALLET]));
    let request: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(request["method"], "eth_getStorageAt");
    assert_eq!(request["params"][0], WALLET);
}
