use std::path::{Path, PathBuf};

use alloy::primitives::{Address, B256, U256};
use sha3::{Digest, Keccak256};

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Returns
/// The parsed address
///
/// # Errors
/// Returns an error if the address is not 40 hex characters, contains invalid hex,
/// or is the zero address
pub fn parse_address(addr_str: &str) -> anyhow::Result<Address> {
    let cleaned = addr_str
        .trim()
        .strip_prefix("0x")
        .unwrap_or(addr_str.trim());
    if cleaned.len() != 40 {
        anyhow::bail!(
            "Invalid address length: expected 40 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    if address == [0u8; 20] {
        anyhow::bail!("Zero address not allowed");
    }
    Ok(Address::from(address))
}

/// Parses a 32-byte hash (a merkle proof node) from a hex string.
pub fn parse_hash(hash_str: &str) -> anyhow::Result<B256> {
    let cleaned = hash_str
        .trim()
        .strip_prefix("0x")
        .unwrap_or(hash_str.trim());
    if cleaned.len() != 64 {
        anyhow::bail!(
            "Invalid hash length: expected 64 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    Ok(B256::from(hash))
}

/// Computes a Keccak256 hash of two 32-byte values concatenated.
pub fn keccak256_hash(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let hash = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();
    hash.into()
}

/// Computes the orchard leaf for a claim: `keccak256(abi.encodePacked(claimer, balance))`.
///
/// # Arguments
/// * `claimer` - Address the distribution was allotted to
/// * `balance` - Claimable amount in the token's smallest unit
///
/// # Returns
/// 32-byte merkle leaf
pub fn claim_leaf(claimer: &Address, balance: U256) -> [u8; 32] {
    let hash = Keccak256::new()
        .chain_update(claimer.as_slice())
        .chain_update(balance.to_be_bytes::<32>())
        .finalize();
    hash.into()
}

/// Folds a merkle proof into the root it authenticates.
///
/// Pairs are hashed in sorted order, so the proof carries no left/right flags.
pub fn compute_root(leaf: [u8; 32], proof: &[B256]) -> B256 {
    let mut current = leaf;
    for node in proof {
        let sibling = node.0;
        current = if current <= sibling {
            keccak256_hash(current, sibling)
        } else {
            keccak256_hash(sibling, current)
        };
    }
    B256::from(current)
}

/// Expand a path, replacing `~` with the user's home directory
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
