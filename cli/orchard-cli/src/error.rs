use std::path::PathBuf;

use alloy::primitives::{TxHash, U256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse proof file {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid entry in {path:?}: {reason}")]
    InvalidEntry { path: PathBuf, reason: String },

    #[error("Proof file {0:?} has a config block but no tokens_data")]
    MissingTokens(PathBuf),

    #[error("Distribution offset {offset} exceeds week {week}")]
    NegativeDistribution { week: u64, offset: u64 },

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),
}

pub type Result<T> = std::result::Result<T, ClaimError>;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),

    #[error("Check failed: {check}: expected {expected}, got {actual}")]
    Check {
        check: &'static str,
        expected: U256,
        actual: U256,
    },
}

/// Maps a transport or contract error into [`ClaimError::RpcError`], tagged with the call name.
pub(crate) fn rpc_error<E: std::fmt::Display>(call: &'static str) -> impl FnOnce(E) -> ClaimError {
    move |e| ClaimError::RpcError(format!("{}: {}", call, e))
}
