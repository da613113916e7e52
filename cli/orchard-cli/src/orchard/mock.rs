use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use alloy::primitives::{Address, TxHash, B256};
use tracing::debug;

use super::{Claim, Orchard};
use crate::error::{ClaimError, Result};

type ClaimKey = (Address, Address, u64, Address);

/// A recorded `claimDistributions` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub claimer: Address,
    pub claims: Vec<Claim>,
    pub tokens: Vec<Address>,
    pub tx_hash: TxHash,
}

#[derive(Debug, Default)]
struct MockState {
    /// (token, distributor, distribution_id, claimer)
    claimed: HashSet<ClaimKey>,
    names: HashMap<Address, String>,
    roots: HashMap<(Address, Address, u64), B256>,
    submissions: Vec<Submission>,
    tx_counter: u64,
}

/// In-memory orchard. Contracts without a registered name fail the `name()` read.
#[derive(Debug, Default)]
pub struct MockOrchard {
    state: RwLock<MockState>,
}

impl MockOrchard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ERC-20 name for `address`.
    pub fn with_name(self, address: Address, name: &str) -> Self {
        self.state
            .write()
            .expect("orchard lock poisoned")
            .names
            .insert(address, name.to_string());
        self
    }

    /// Publish a root for a distribution.
    pub fn with_root(
        self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
        root: B256,
    ) -> Self {
        self.state
            .write()
            .expect("orchard lock poisoned")
            .roots
            .insert((token, distributor, distribution_id), root);
        self
    }

    /// Mark a distribution as already claimed.
    pub fn mark_claimed(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
        claimer: Address,
    ) {
        self.state
            .write()
            .expect("orchard lock poisoned")
            .claimed
            .insert((token, distributor, distribution_id, claimer));
    }

    /// Every claim transaction submitted so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.read().expect("orchard lock poisoned").submissions.clone()
    }

    fn next_tx_hash(state: &mut MockState) -> TxHash {
        state.tx_counter += 1;
        let mut hash = [0u8; 32];
        hash[0..8].copy_from_slice(&state.tx_counter.to_be_bytes());
        hash[8..16].copy_from_slice(b"mocktxn!");
        TxHash::from(hash)
    }
}

impl Orchard for MockOrchard {
    async fn is_claimed(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
        claimer: Address,
    ) -> Result<bool> {
        let state = self.state.read().expect("orchard lock poisoned");
        Ok(state
            .claimed
            .contains(&(token, distributor, distribution_id, claimer)))
    }

    async fn claim_distributions(
        &self,
        claimer: Address,
        claims: Vec<Claim>,
        tokens: Vec<Address>,
    ) -> Result<TxHash> {
        let mut state = self.state.write().expect("orchard lock poisoned");
        let tx_hash = Self::next_tx_hash(&mut state);

        let mut keys = Vec::with_capacity(claims.len());
        for claim in &claims {
            let token = *tokens
                .get(claim.token_index)
                .ok_or(ClaimError::Reverted(tx_hash))?;
            let key = (token, claim.distributor, claim.distribution_id, claimer);
            if state.claimed.contains(&key) || keys.contains(&key) {
                return Err(ClaimError::Reverted(tx_hash));
            }
            keys.push(key);
        }

        state.claimed.extend(keys);
        debug!("Mock claim {} for {}", tx_hash, claimer);
        state.submissions.push(Submission {
            claimer,
            claims,
            tokens,
            tx_hash,
        });
        Ok(tx_hash)
    }

    async fn token_name(&self, token: Address) -> Result<String> {
        self.state
            .read()
            .expect("orchard lock poisoned")
            .names
            .get(&token)
            .cloned()
            .ok_or_else(|| ClaimError::RpcError(format!("name: execution reverted ({})", token)))
    }

    async fn distribution_root(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
    ) -> Result<B256> {
        Ok(self
            .state
            .read()
            .expect("orchard lock poisoned")
            .roots
            .get(&(token, distributor, distribution_id))
            .copied()
            .unwrap_or(B256::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn claim(distribution_id: u64, distributor: Address) -> Claim {
        Claim {
            distribution_id,
            balance: U256::from(100u64),
            distributor,
            token_index: 0,
            merkle_proof: vec![],
        }
    }

    #[tokio::test]
    async fn test_mock_claim_marks_claimed() {
        let orchard = MockOrchard::new();
        let token = Address::from([1u8; 20]);
        let distributor = Address::from([2u8; 20]);
        let claimer = Address::from([3u8; 20]);

        assert!(!orchard.is_claimed(token, distributor, 5, claimer).await.unwrap());

        let tx = orchard
            .claim_distributions(claimer, vec![claim(5, distributor)], vec![token])
            .await
            .unwrap();
        assert_ne!(tx, TxHash::ZERO);
        assert!(orchard.is_claimed(token, distributor, 5, claimer).await.unwrap());
        assert!(!orchard.is_claimed(token, distributor, 6, claimer).await.unwrap());
        assert_eq!(orchard.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_double_claim_reverts() {
        let orchard = MockOrchard::new();
        let token = Address::from([1u8; 20]);
        let distributor = Address::from([2u8; 20]);
        let claimer = Address::from([3u8; 20]);
        orchard.mark_claimed(token, distributor, 5, claimer);

        let result = orchard
            .claim_distributions(claimer, vec![claim(5, distributor)], vec![token])
            .await;
        assert!(matches!(result, Err(ClaimError::Reverted(_))));
        assert!(orchard.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_mock_token_name() {
        let known = Address::from([9u8; 20]);
        let orchard = MockOrchard::new().with_name(known, "Strategy");
        assert_eq!(orchard.token_name(known).await.unwrap(), "Strategy");
        assert!(orchard.token_name(Address::from([8u8; 20])).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_tx_hashes_are_unique() {
        let orchard = MockOrchard::new();
        let token = Address::from([1u8; 20]);
        let distributor = Address::from([2u8; 20]);
        let first = orchard
            .claim_distributions(Address::from([3u8; 20]), vec![claim(1, distributor)], vec![token])
            .await
            .unwrap();
        let second = orchard
            .claim_distributions(Address::from([4u8; 20]), vec![claim(1, distributor)], vec![token])
            .await
            .unwrap();
        assert_ne!(first, second);
    }
}
