//! Merkle proof files produced by the upstream distribution pipeline.
//!
//! Each file carries a `config` block (`week`, `offset`) and a `tokens_data`
//! list of per-claimer entries. Files are only ever read here.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, trace};

use crate::common::{parse_address, parse_hash};
use crate::error::{ClaimError, Result};

/// Week/offset pair identifying a reward round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DistributionConfig {
    pub week: u64,
    pub offset: u64,
}

impl DistributionConfig {
    /// Distribution identifier used by the orchard: `week - offset`.
    pub fn distribution_id(&self) -> Result<u64> {
        self.week
            .checked_sub(self.offset)
            .ok_or(ClaimError::NegativeDistribution {
                week: self.week,
                offset: self.offset,
            })
    }
}

/// One claimable entry of a proof file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReward {
    /// Claimer the amount was allotted to
    pub address: Address,
    /// Claimable amount in the reward token's smallest unit
    pub claim_amount: U256,
    /// Proof nodes, leaf to root
    pub hex_proof: Vec<B256>,
}

#[derive(Debug, Clone)]
pub struct ProofFile {
    pub path: PathBuf,
    pub config: DistributionConfig,
    pub rewards: Vec<TokenReward>,
}

#[derive(Debug, Deserialize)]
struct RawTokenReward {
    address: String,
    /// Kept as source text so integers wider than u64 survive
    claim_amount: Box<RawValue>,
    hex_proof: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawProofFile {
    config: Option<DistributionConfig>,
    tokens_data: Option<Vec<RawTokenReward>>,
}

impl RawTokenReward {
    fn into_reward(self) -> anyhow::Result<TokenReward> {
        let address = parse_address(&self.address)?;
        let claim_amount = parse_amount(self.claim_amount.get())?;
        let hex_proof = self
            .hex_proof
            .iter()
            .map(|node| parse_hash(node))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(TokenReward {
            address,
            claim_amount,
            hex_proof,
        })
    }
}

/// Accepts a JSON integer of any width or a string holding one.
fn parse_amount(raw: &str) -> anyhow::Result<U256> {
    let text = if raw.starts_with('"') {
        serde_json::from_str::<String>(raw)?
    } else {
        raw.to_string()
    };
    U256::from_str(text.trim()).map_err(|e| anyhow::anyhow!("Invalid claim amount {}: {}", raw, e))
}

/// Parses the contents of a proof file.
///
/// Returns `Ok(None)` when the document has no `config` block; such files are
/// skipped by the claim loop.
pub fn parse(path: &Path, contents: &str) -> Result<Option<ProofFile>> {
    let raw: RawProofFile = serde_json::from_str(contents).map_err(|source| ClaimError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(config) = raw.config else {
        return Ok(None);
    };
    let entries = raw
        .tokens_data
        .ok_or_else(|| ClaimError::MissingTokens(path.to_path_buf()))?;

    let rewards = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            entry.into_reward().map_err(|e| ClaimError::InvalidEntry {
                path: path.to_path_buf(),
                reason: format!("tokens_data[{}]: {}", i, e),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(ProofFile {
        path: path.to_path_buf(),
        config,
        rewards,
    }))
}

/// Reads and parses a proof file from disk.
pub fn load(path: &Path) -> Result<Option<ProofFile>> {
    let contents = fs::read_to_string(path).map_err(|source| ClaimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &contents)
}

/// Recursively collects files under `root` whose file name starts with `prefix`.
///
/// A missing root yields no files. Results are sorted by path.
pub fn discover(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !root.exists() {
        debug!("Proof directory {:?} does not exist", root);
        return Ok(found);
    }
    walk(root, prefix, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, prefix: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let io_err = |source| ClaimError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            walk(&path, prefix, found)?;
        } else if entry.file_name().to_string_lossy().starts_with(prefix) {
            trace!("Matched proof file {:?}", path);
            found.push(path);
        }
    }
    Ok(())
}
