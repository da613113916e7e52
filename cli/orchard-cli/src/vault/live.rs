use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use tracing::{debug, info};

use super::{NamedAccounts, Result, VaultHarness};
use crate::error::ScenarioError;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IVault {
        function deposit(uint256 amount) external returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function withdraw(uint256 maxShares, address recipient, uint256 maxLoss) external returns (uint256);
        function setEmergencyShutdown(bool active) external;
    }

    #[sol(rpc)]
    interface IStrategy {
        function harvest() external;
        function estimateTotalAssets() external returns (uint256);
        function setEmergencyExit() external;
    }
}

/// Sends a contract call from an unlocked node account and checks the receipt.
macro_rules! transact {
    ($call:expr, $from:expr, $name:literal) => {{
        let receipt = $call
            .from($from)
            .send()
            .await
            .map_err(|e| ScenarioError::RpcError(format!("{}: {}", $name, e)))?
            .get_receipt()
            .await
            .map_err(|e| ScenarioError::RpcError(format!("{} receipt: {}", $name, e)))?;
        if !receipt.status() {
            return Err(ScenarioError::Reverted(receipt.transaction_hash));
        }
        debug!("{} mined in {}", $name, receipt.transaction_hash);
        Ok(())
    }};
}

fn rpc_error<E: std::fmt::Display>(call: &'static str) -> impl FnOnce(E) -> ScenarioError {
    move |e| ScenarioError::RpcError(format!("{}: {}", call, e))
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Development node endpoint (anvil, ganache, hardhat)
    pub rpc_url: String,
    pub token: Address,
    pub vault: Address,
    pub strategy: Address,
    pub accounts: NamedAccounts,
}

/// Harness against a development node whose named accounts are unlocked.
///
/// Transactions go out through `eth_sendTransaction`; time moves with
/// `evm_increaseTime` and `evm_mine`.
pub struct LiveHarness {
    config: HarnessConfig,
    provider: DynProvider,
}

impl LiveHarness {
    pub async fn connect(config: HarnessConfig) -> Result<Self> {
        info!("Connecting harness to {}", config.rpc_url);
        let provider = ProviderBuilder::new()
            .connect(&config.rpc_url)
            .await
            .map_err(rpc_error("connect"))?
            .erased();
        Ok(Self { config, provider })
    }

    fn token(&self) -> IERC20::IERC20Instance<DynProvider> {
        IERC20::new(self.config.token, self.provider.clone())
    }

    fn vault_contract(&self) -> IVault::IVaultInstance<DynProvider> {
        IVault::new(self.config.vault, self.provider.clone())
    }

    fn strategy_contract(&self) -> IStrategy::IStrategyInstance<DynProvider> {
        IStrategy::new(self.config.strategy, self.provider.clone())
    }
}

impl VaultHarness for LiveHarness {
    fn accounts(&self) -> &NamedAccounts {
        &self.config.accounts
    }

    fn vault(&self) -> Address {
        self.config.vault
    }

    fn strategy(&self) -> Address {
        self.config.strategy
    }

    async fn token_balance(&self, holder: Address) -> Result<U256> {
        self.token()
            .balanceOf(holder)
            .call()
            .await
            .map_err(rpc_error("balanceOf"))
    }

    async fn token_approve(&self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        let token = self.token();
        transact!(token.approve(spender, amount), owner, "approve")
    }

    async fn token_transfer(&self, from: Address, to: Address, amount: U256) -> Result<()> {
        let token = self.token();
        transact!(token.transfer(to, amount), from, "transfer")
    }

    async fn vault_deposit(&self, from: Address, amount: U256) -> Result<()> {
        let vault = self.vault_contract();
        transact!(vault.deposit(amount), from, "deposit")
    }

    async fn vault_shares(&self, holder: Address) -> Result<U256> {
        self.vault_contract()
            .balanceOf(holder)
            .call()
            .await
            .map_err(rpc_error("vault balanceOf"))
    }

    async fn vault_withdraw(
        &self,
        from: Address,
        shares: U256,
        recipient: Address,
        max_loss_bps: u64,
    ) -> Result<()> {
        let vault = self.vault_contract();
        transact!(
            vault.withdraw(shares, recipient, U256::from(max_loss_bps)),
            from,
            "withdraw"
        )
    }

    async fn set_emergency_shutdown(&self, from: Address, active: bool) -> Result<()> {
        let vault = self.vault_contract();
        transact!(vault.setEmergencyShutdown(active), from, "setEmergencyShutdown")
    }

    async fn harvest(&self, from: Address) -> Result<()> {
        let strategy = self.strategy_contract();
        transact!(strategy.harvest(), from, "harvest")
    }

    async fn estimate_total_assets(&self, from: Address) -> Result<U256> {
        self.strategy_contract()
            .estimateTotalAssets()
            .from(from)
            .call()
            .await
            .map_err(rpc_error("estimateTotalAssets"))
    }

    async fn set_emergency_exit(&self, from: Address) -> Result<()> {
        let strategy = self.strategy_contract();
        transact!(strategy.setEmergencyExit(), from, "setEmergencyExit")
    }

    async fn sleep(&self, seconds: u64) -> Result<()> {
        let _: serde_json::Value = self
            .provider
            .raw_request("evm_increaseTime".into(), (seconds,))
            .await
            .map_err(rpc_error("evm_increaseTime"))?;
        debug!("Advanced chain time by {}s", seconds);
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> Result<()> {
        for _ in 0..blocks {
            let _: serde_json::Value = self
                .provider
                .raw_request("evm_mine".into(), ())
                .await
                .map_err(rpc_error("evm_mine"))?;
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<U256> {
        self.provider
            .raw_request("evm_snapshot".into(), ())
            .await
            .map_err(rpc_error("evm_snapshot"))
    }

    async fn revert(&self, snapshot: U256) -> Result<()> {
        let reverted: bool = self
            .provider
            .raw_request("evm_revert".into(), (snapshot,))
            .await
            .map_err(rpc_error("evm_revert"))?;
        if !reverted {
            return Err(ScenarioError::RpcError(format!(
                "evm_revert: snapshot {} was not restored",
                snapshot
            )));
        }
        Ok(())
    }
}
