use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use tracing::{debug, info};

use super::{Claim, Orchard};
use crate::error::{rpc_error, ClaimError, Result};
use crate::rewards::MERKLE_ORCHARD;

sol! {
    #[sol(rpc)]
    interface IMerkleOrchard {
        struct Claim {
            uint256 distributionId;
            uint256 balance;
            address distributor;
            uint256 tokenIndex;
            bytes32[] merkleProof;
        }

        function isClaimed(address token, address distributor, uint256 distributionId, address claimer) external view returns (bool);
        function getDistributionRoot(address token, address distributor, uint256 distributionId) external view returns (bytes32);
        function claimDistributions(address claimer, Claim[] memory claims, address[] memory tokens) external;
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
    }
}

/// Orchard client configuration
#[derive(Debug, Clone)]
pub struct OrchardConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Deployed MerkleOrchard address
    pub orchard: Address,
    /// Fixed legacy gas price in wei; the node's estimate is used when unset
    pub gas_price: Option<u128>,
}

impl Default for OrchardConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            orchard: MERKLE_ORCHARD,
            gas_price: None,
        }
    }
}

/// Orchard client backed by a JSON-RPC node.
pub struct LiveOrchard {
    config: OrchardConfig,
    provider: DynProvider,
}

impl LiveOrchard {
    /// Connect with a signer; claim transactions are signed locally.
    pub async fn connect(config: OrchardConfig, signer: PrivateKeySigner) -> Result<Self> {
        info!("Connecting to {} as {}", config.rpc_url, signer.address());
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&config.rpc_url)
            .await
            .map_err(rpc_error("connect"))?
            .erased();
        Ok(Self { config, provider })
    }

    /// Connect without a signer. Reads work, claim submission fails.
    pub async fn connect_read_only(config: OrchardConfig) -> Result<Self> {
        info!("Connecting to {} (read-only)", config.rpc_url);
        let provider = ProviderBuilder::new()
            .connect(&config.rpc_url)
            .await
            .map_err(rpc_error("connect"))?
            .erased();
        Ok(Self { config, provider })
    }

    fn orchard(&self) -> IMerkleOrchard::IMerkleOrchardInstance<DynProvider> {
        IMerkleOrchard::new(self.config.orchard, self.provider.clone())
    }
}

impl Orchard for LiveOrchard {
    async fn is_claimed(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
        claimer: Address,
    ) -> Result<bool> {
        self.orchard()
            .isClaimed(token, distributor, U256::from(distribution_id), claimer)
            .call()
            .await
            .map_err(rpc_error("isClaimed"))
    }

    async fn claim_distributions(
        &self,
        claimer: Address,
        claims: Vec<Claim>,
        tokens: Vec<Address>,
    ) -> Result<TxHash> {
        let claims = claims
            .into_iter()
            .map(|claim| IMerkleOrchard::Claim {
                distributionId: U256::from(claim.distribution_id),
                balance: claim.balance,
                distributor: claim.distributor,
                tokenIndex: U256::from(claim.token_index),
                merkleProof: claim.merkle_proof,
            })
            .collect::<Vec<_>>();

        let orchard = self.orchard();
        let mut call = orchard.claimDistributions(claimer, claims, tokens);
        if let Some(gas_price) = self.config.gas_price {
            call = call.gas_price(gas_price);
        }

        let pending = call.send().await.map_err(rpc_error("claimDistributions"))?;
        debug!("Submitted claim transaction {}", pending.tx_hash());
        let receipt = pending
            .get_receipt()
            .await
            .map_err(rpc_error("claimDistributions receipt"))?;

        if !receipt.status() {
            return Err(ClaimError::Reverted(receipt.transaction_hash));
        }
        info!(
            "Claim for {} confirmed in block {:?}",
            claimer, receipt.block_number
        );
        Ok(receipt.transaction_hash)
    }

    async fn token_name(&self, token: Address) -> Result<String> {
        IERC20Metadata::new(token, self.provider.clone())
            .name()
            .call()
            .await
            .map_err(rpc_error("name"))
    }

    async fn distribution_root(
        &self,
        token: Address,
        distributor: Address,
        distribution_id: u64,
    ) -> Result<B256> {
        self.orchard()
            .getDistributionRoot(token, distributor, U256::from(distribution_id))
            .call()
            .await
            .map_err(rpc_error("getDistributionRoot"))
    }
}
