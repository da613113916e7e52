//! Emergency-shutdown scenarios for a vault / strategy pair.
//!
//! Both scenarios start from a fresh deposit of `amount` by the user and
//! check that the full amount is recoverable once the emergency switch is
//! thrown: at the vault level (shutdown, then withdraw) or at the strategy
//! level (exit, then harvest everything back into the vault).

use std::fmt;

use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::error::ScenarioError;
use crate::vault::{Result, VaultHarness};

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// Loss accepted on the shutdown withdrawal, in basis points.
const WITHDRAW_MAX_LOSS_BPS: u64 = 10;

/// Relative tolerance for approximate equality on token amounts.
///
/// `actual` matches `expected` when `|actual - expected| <= rel * actual`, the
/// observed value setting the scale as in `approx(observed, rel=R) == amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeTolerance {
    nanos: u64,
}

impl RelativeTolerance {
    const SCALE: u64 = 1_000_000_000;

    /// Tolerance from a fraction such as `1e-3`. Resolution is 1e-9; negatives clamp to zero.
    pub fn new(rel: f64) -> Self {
        let nanos = (rel.max(0.0) * Self::SCALE as f64).round() as u64;
        Self { nanos }
    }

    pub fn approx_eq(&self, actual: U256, expected: U256) -> bool {
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        let scaled_diff = diff.saturating_mul(U256::from(Self::SCALE));
        scaled_diff <= actual.saturating_mul(U256::from(self.nanos))
    }
}

impl Default for RelativeTolerance {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl fmt::Display for RelativeTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nanos as f64 / Self::SCALE as f64)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScenarioConfig {
    /// Amount the user deposits, in the token's smallest unit
    pub amount: U256,
    pub tolerance: RelativeTolerance,
}

impl ScenarioConfig {
    fn expect_approx(&self, check: &'static str, actual: U256) -> Result<()> {
        if self.tolerance.approx_eq(actual, self.amount) {
            Ok(())
        } else {
            Err(ScenarioError::Check {
                check,
                expected: self.amount,
                actual,
            })
        }
    }
}

fn expect_eq(check: &'static str, actual: U256, expected: U256) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(ScenarioError::Check {
            check,
            expected,
            actual,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Vault shutdown: the depositor can still withdraw everything
    VaultShutdownCanWithdraw,
    /// Strategy emergency exit: harvest returns everything to the vault
    BasicShutdown,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::VaultShutdownCanWithdraw, Scenario::BasicShutdown];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::VaultShutdownCanWithdraw => "vault_shutdown_can_withdraw",
            Scenario::BasicShutdown => "basic_shutdown",
        }
    }

    pub async fn run<H: VaultHarness>(&self, harness: &H, config: &ScenarioConfig) -> Result<()> {
        match self {
            Scenario::VaultShutdownCanWithdraw => vault_shutdown_can_withdraw(harness, config).await,
            Scenario::BasicShutdown => basic_shutdown(harness, config).await,
        }
    }
}

/// Runs `scenario` between a snapshot and a revert, so each run sees the same chain state.
///
/// The revert happens whether or not the scenario passed; a revert failure
/// only surfaces when the scenario itself succeeded.
pub async fn run_isolated<H: VaultHarness>(
    harness: &H,
    scenario: Scenario,
    config: &ScenarioConfig,
) -> Result<()> {
    let snapshot = harness.snapshot().await?;
    info!("Running {} (snapshot {})", scenario.name(), snapshot);

    let outcome = scenario.run(harness, config).await;
    let reverted = harness.revert(snapshot).await;

    match (outcome, reverted) {
        (Err(e), Err(revert_err)) => {
            warn!("Failed to revert after {}: {}", scenario.name(), revert_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), revert) => revert,
    }
}

async fn deposit<H: VaultHarness>(harness: &H, user: Address, amount: U256) -> Result<()> {
    harness.token_approve(user, harness.vault(), amount).await?;
    harness.vault_deposit(user, amount).await?;
    expect_eq(
        "vault token balance after deposit",
        harness.token_balance(harness.vault()).await?,
        amount,
    )
}

/// Deposit, harvest, let 7 hours pass, shut the vault down, and withdraw all shares.
pub async fn vault_shutdown_can_withdraw<H: VaultHarness>(
    harness: &H,
    config: &ScenarioConfig,
) -> Result<()> {
    let accounts = *harness.accounts();
    deposit(harness, accounts.user, config.amount).await?;

    let leftover = harness.token_balance(accounts.user).await?;
    if leftover > U256::ZERO {
        harness
            .token_transfer(accounts.user, Address::ZERO, leftover)
            .await?;
    }

    // Send funds through the strategy
    harness.harvest(accounts.gov).await?;

    harness.sleep(7 * HOUR).await?;
    harness.mine(1).await?;
    config.expect_approx(
        "strategy estimated total assets",
        harness.estimate_total_assets(accounts.user).await?,
    )?;

    harness.set_emergency_shutdown(accounts.gov, true).await?;

    let shares = harness.vault_shares(accounts.user).await?;
    harness
        .vault_withdraw(accounts.user, shares, accounts.user, WITHDRAW_MAX_LOSS_BPS)
        .await?;

    config.expect_approx(
        "user token balance after withdraw",
        harness.token_balance(accounts.user).await?,
    )
}

/// Deposit, harvest twice around a day of accrual, trigger emergency exit, and harvest out.
pub async fn basic_shutdown<H: VaultHarness>(harness: &H, config: &ScenarioConfig) -> Result<()> {
    let accounts = *harness.accounts();
    deposit(harness, accounts.user, config.amount).await?;

    // Harvest 1: send funds through the strategy
    harness.harvest(accounts.gov).await?;
    harness.mine(1).await?;
    config.expect_approx(
        "strategy estimated total assets",
        harness.estimate_total_assets(accounts.user).await?,
    )?;

    harness.sleep(DAY).await?;
    harness.mine(1).await?;

    // Harvest 2: realize profit, which unlocks over 6 hours
    harness.harvest(accounts.gov).await?;
    harness.sleep(6 * HOUR).await?;
    harness.mine(1).await?;

    harness.set_emergency_exit(accounts.strategist).await?;
    harness.harvest(accounts.gov).await?;

    expect_eq(
        "strategy token balance after emergency exit",
        harness.token_balance(harness.strategy()).await?,
        U256::ZERO,
    )?;
    config.expect_approx(
        "vault token balance after emergency exit",
        harness.token_balance(harness.vault()).await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_within_bounds() {
        let tol = RelativeTolerance::new(1e-3);
        let expected = U256::from(1_000_000u64);
        assert!(tol.approx_eq(U256::from(1_000_000u64), expected));
        assert!(tol.approx_eq(U256::from(1_001_000u64), expected));
        assert!(tol.approx_eq(U256::from(999_001u64), expected));
        assert!(!tol.approx_eq(U256::from(1_001_002u64), expected));
        assert!(!tol.approx_eq(U256::from(999_000u64), expected));
    }

    #[test]
    fn test_tolerance_scales_with_actual() {
        let tol = RelativeTolerance::new(1e-3);
        let expected = U256::from(1_000_000u64);
        // 1001 <= 1e-3 * 1_001_001, but not <= 1e-3 * 1_000_000
        assert!(tol.approx_eq(U256::from(1_001_001u64), expected));
        // 1000 > 1e-3 * 999_000
        assert!(!tol.approx_eq(U256::from(999_000u64), expected));
    }

    #[test]
    fn test_tolerance_zero_actual_is_exact() {
        let tol = RelativeTolerance::default();
        assert!(tol.approx_eq(U256::ZERO, U256::ZERO));
        assert!(!tol.approx_eq(U256::ZERO, U256::from(1u64)));
        assert!(!tol.approx_eq(U256::from(1u64), U256::ZERO));
    }

    #[test]
    fn test_tolerance_negative_clamps() {
        let tol = RelativeTolerance::new(-0.5);
        assert!(tol.approx_eq(U256::from(5u64), U256::from(5u64)));
        assert!(!tol.approx_eq(U256::from(6u64), U256::from(5u64)));
    }

    #[test]
    fn test_tolerance_large_amounts() {
        let tol = RelativeTolerance::new(1e-3);
        let amount = U256::from(10u64).pow(U256::from(30u64));
        let off = amount / U256::from(2000u64);
        assert!(tol.approx_eq(amount + off, amount));
        assert!(!tol.approx_eq(amount + off * U256::from(3u64), amount));
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(Scenario::ALL.len(), 2);
        assert_eq!(Scenario::VaultShutdownCanWithdraw.name(), "vault_shutdown_can_withdraw");
        assert_eq!(Scenario::BasicShutdown.name(), "basic_shutdown");
    }
}
