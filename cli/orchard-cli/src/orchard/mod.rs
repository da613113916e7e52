//! Remote MerkleOrchard boundary.
//!
//! The orchard contract owns all distribution state. This module only names
//! the calls the claim loop makes against it:
//! - **Live**: alloy provider with a local signer ([`LiveOrchard`]).
//! - **Mock**: in-memory claimed set and call log for tests ([`MockOrchard`]).

mod live;
mod mock;

pub use live::{LiveOrchard, OrchardConfig};
pub use mock::{MockOrchard, Submission};

use alloy::primitives::{Address, TxHash, B256, U256};

use crate::error::Result;

/// One entry of a `claimDistributions` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub distribution_id: u64,
    pub balance: U256,
    pub distributor: Address,
    /// Index into the `tokens` argument of the same call
    pub token_index: usize,
    pub merkle_proof: Vec<B256>,
}

#[allow(async_fn_in_trait)]
pub trait Orchard {
    /// Whether `claimer` already claimed distribution `distribution_id` of `token` from `distributor`.
    async fn is_claimed(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
        claimer: Address,
    ) -> Result<bool>;

    /// Submits a claim transaction and waits for its receipt.
    async fn claim_distributions(
        &self,
        claimer: Address,
        claims: Vec<Claim>,
        tokens: Vec<Address>,
    ) -> Result<TxHash>;

    /// ERC-20 `name()` of an arbitrary contract.
    async fn token_name(&self, token: Address) -> Result<String>;

    /// Merkle root published for a distribution.
    async fn distribution_root(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
    ) -> Result<B256>;
}
