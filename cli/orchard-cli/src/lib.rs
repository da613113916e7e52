pub mod account;
pub mod claims;
pub mod common;
pub mod error;
pub mod logging;
pub mod orchard;
pub mod proofs;
pub mod rewards;
pub mod scenarios;
pub mod vault;

pub use common::{
    claim_leaf, compute_root, expand_path, keccak256_hash, parse_address, parse_hash,
};
pub use error::{ClaimError, Result, ScenarioError};
