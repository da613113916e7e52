//! Reward programs: which proof files pay out which token through which distributor.

use std::fs;
use std::path::Path;

use alloy::primitives::{address, Address};
use serde::Deserialize;

use crate::common::parse_address;
use crate::error::{ClaimError, Result};

/// Balancer MerkleOrchard on Ethereum mainnet.
pub const MERKLE_ORCHARD: Address = address!("0xdae7e32adc5d490a43ccba1f0c736033f2b4efca");

pub const BAL_TOKEN: Address = address!("0xba100000625a3754423978a60c9317c58a424e3d");
pub const BAL_DISTRIBUTOR: Address = address!("0xd2eb7bd802a7ca68d9acd209bec4e664a9abdd7b");
pub const LDO_TOKEN: Address = address!("0x5a98fcbea516cf06857215779fd812ca3bef1b32");
pub const LDO_DISTRIBUTOR: Address = address!("0x55c8de1ac17c1a937293416c9bce5789cbbf61d1");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardProgram {
    /// File name prefix of the proof files belonging to this program
    pub prefix: String,
    /// Reward token paid out
    pub token: Address,
    /// Distributor that published the roots
    pub distributor: Address,
    /// Ticker used in printed output
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
struct RawRewardProgram {
    prefix: String,
    token: String,
    distributor: String,
    symbol: String,
}

impl RewardProgram {
    /// BAL and LDO weekly distributions on mainnet.
    pub fn homestead_defaults() -> Vec<Self> {
        vec![
            Self {
                prefix: "homestead_".to_string(),
                token: BAL_TOKEN,
                distributor: BAL_DISTRIBUTOR,
                symbol: "BAL".to_string(),
            },
            Self {
                prefix: "homestead-lido_".to_string(),
                token: LDO_TOKEN,
                distributor: LDO_DISTRIBUTOR,
                symbol: "LDO".to_string(),
            },
        ]
    }
}

/// Loads a JSON array of reward programs, replacing the defaults.
///
/// ```json
/// [{ "prefix": "homestead_", "token": "0x…", "distributor": "0x…", "symbol": "BAL" }]
/// ```
pub fn load_programs(path: &Path) -> Result<Vec<RewardProgram>> {
    let contents = fs::read_to_string(path).map_err(|source| ClaimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_programs(path, &contents)
}

fn parse_programs(path: &Path, contents: &str) -> Result<Vec<RewardProgram>> {
    let raw: Vec<RawRewardProgram> =
        serde_json::from_str(contents).map_err(|source| ClaimError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(i, program)| {
            let invalid = |e: anyhow::Error| ClaimError::InvalidEntry {
                path: path.to_path_buf(),
                reason: format!("program {} ({}): {}", i, program.symbol, e),
            };
            if program.prefix.is_empty() {
                return Err(invalid(anyhow::anyhow!("empty file prefix")));
            }
            Ok(RewardProgram {
                token: parse_address(&program.token).map_err(invalid)?,
                distributor: parse_address(&program.distributor).map_err(invalid)?,
                prefix: program.prefix.clone(),
                symbol: program.symbol.clone(),
            })
        })
        .collect()
}
