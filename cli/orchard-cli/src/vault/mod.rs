//! Harness surface over a deployed vault / strategy pair.
//!
//! The vault and strategy contracts own all accounting; the harness only
//! exposes the calls the shutdown scenarios drive, plus chain time control.

mod live;

pub use live::{HarnessConfig, LiveHarness};

use alloy::primitives::{Address, U256};

use crate::error::ScenarioError;

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Accounts the scenarios act as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedAccounts {
    /// Depositor
    pub user: Address,
    /// Vault governance, also the keeper calling `harvest`
    pub gov: Address,
    /// Strategy owner, allowed to trigger emergency exit
    pub strategist: Address,
}

#[allow(async_fn_in_trait)]
pub trait VaultHarness {
    fn accounts(&self) -> &NamedAccounts;
    fn vault(&self) -> Address;
    fn strategy(&self) -> Address;

    async fn token_balance(&self, holder: Address) -> Result<U256>;
    async fn token_approve(&self, owner: Address, spender: Address, amount: U256) -> Result<()>;
    async fn token_transfer(&self, from: Address, to: Address, amount: U256) -> Result<()>;

    async fn vault_deposit(&self, from: Address, amount: U256) -> Result<()>;
    /// Vault share balance of `holder`
    async fn vault_shares(&self, holder: Address) -> Result<U256>;
    /// Redeem `shares` to `recipient`, accepting at most `max_loss_bps` loss.
    async fn vault_withdraw(
        &self,
        from: Address,
        shares: U256,
        recipient: Address,
        max_loss_bps: u64,
    ) -> Result<()>;
    async fn set_emergency_shutdown(&self, from: Address, active: bool) -> Result<()>;

    async fn harvest(&self, from: Address) -> Result<()>;
    async fn estimate_total_assets(&self, from: Address) -> Result<U256>;
    async fn set_emergency_exit(&self, from: Address) -> Result<()>;

    /// Advance the chain clock without mining.
    async fn sleep(&self, seconds: u64) -> Result<()>;
    async fn mine(&self, blocks: u64) -> Result<()>;
    /// Snapshot chain state; pair with [`VaultHarness::revert`].
    async fn snapshot(&self) -> Result<U256>;
    async fn revert(&self, snapshot: U256) -> Result<()>;
}
