//! Account selection: encrypted JSON keystores picked from an interactive
//! prompt, or a raw private key.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::common::expand_path;

/// Default keystore directory: `~/.orchard/accounts`
pub fn default_keystore_dir() -> PathBuf {
    expand_path(Path::new("~/.orchard/accounts"))
}

/// A signer ready to submit transactions.
pub struct LoadedAccount {
    pub name: String,
    pub address: Address,
    pub signer: PrivateKeySigner,
}

/// Lists account names (keystore file stems) in `dir`, sorted.
pub fn keystore_names(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read keystore directory {:?}", dir))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.context("Failed to read keystore entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Prompts until the answer is one of `choices`.
///
/// Renders as `Account (alice, bob): `. End of input is an error.
pub fn prompt_choice<R: BufRead, W: Write>(
    label: &str,
    choices: &[String],
    mut input: R,
    mut output: W,
) -> Result<String> {
    if choices.is_empty() {
        anyhow::bail!("No choices available for {}", label);
    }

    loop {
        write!(output, "{} ({}): ", label, choices.join(", ")).context("Failed to write prompt")?;
        output.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("Failed to read answer")?;
        if read == 0 {
            anyhow::bail!("No {} selected", label.to_lowercase());
        }

        let answer = line.trim();
        if let Some(choice) = choices.iter().find(|choice| choice.as_str() == answer) {
            return Ok(choice.clone());
        }
        writeln!(output, "Error: {:?} is not one of {}.", answer, choices.join(", "))
            .context("Failed to write prompt")?;
    }
}

/// Reads one line from `input`, trimmed. The read buffer is zeroized.
pub fn read_secret_line<R: BufRead>(mut input: R) -> Result<String> {
    let mut buffer = String::new();
    input
        .read_line(&mut buffer)
        .context("Failed to read secret from stdin")?;
    let trimmed = buffer.trim().to_string();
    buffer.zeroize();
    Ok(trimmed)
}

/// Reads a password. A terminal gets a hidden prompt; piped input is read as
/// one line after `prompt` is written to `output`.
pub fn read_password<R: BufRead, W: Write>(
    prompt: &str,
    input: R,
    mut output: W,
    interactive: bool,
) -> Result<String> {
    if interactive {
        return rpassword::prompt_password(prompt).context("Failed to read password");
    }
    write!(output, "{}", prompt).context("Failed to write prompt")?;
    output.flush().context("Failed to flush prompt")?;
    read_secret_line(input)
}

/// Decrypts the keystore `<dir>/<name>.json`.
pub fn decrypt_keystore(dir: &Path, name: &str, password: &str) -> Result<LoadedAccount> {
    let path = dir.join(format!("{}.json", name));
    debug!("Decrypting keystore {:?}", path);
    let signer = PrivateKeySigner::decrypt_keystore(&path, password)
        .map_err(|e| anyhow::anyhow!("Failed to decrypt keystore {:?}: {}", path, e))?;
    let address = signer.address();
    info!("Loaded account {} ({})", name, address);
    Ok(LoadedAccount {
        name: name.to_string(),
        address,
        signer,
    })
}

/// Builds an account from a hex private key (with or without `0x`).
pub fn from_private_key(key_str: &str) -> Result<LoadedAccount> {
    let key_str = key_str.trim();
    let key_str = key_str.strip_prefix("0x").unwrap_or(key_str);
    if key_str.is_empty() {
        anyhow::bail!("Private key is empty");
    }
    let mut key_bytes = hex::decode(key_str).context("Invalid private key format")?;
    if key_bytes.len() != 32 {
        let len = key_bytes.len();
        key_bytes.zeroize();
        anyhow::bail!("Invalid private key length: expected 32 bytes, got {}", len);
    }
    let mut private_key_bytes = [0u8; 32];
    private_key_bytes.copy_from_slice(&key_bytes);
    key_bytes.zeroize();

    let signing_key = SigningKey::from_slice(&private_key_bytes);
    private_key_bytes.zeroize();
    let signing_key = signing_key.context("Invalid private key")?;

    let address = private_key_to_address(&signing_key);
    Ok(LoadedAccount {
        name: address.to_string(),
        address,
        signer: PrivateKeySigner::from_signing_key(signing_key),
    })
}

/// Ethereum address of a secp256k1 key: last 20 bytes of keccak256(uncompressed pubkey).
pub fn private_key_to_address(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key();
    let encoded = public_key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..32])
}
