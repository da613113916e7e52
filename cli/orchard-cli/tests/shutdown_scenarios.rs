//! Shutdown scenarios against a simulated vault / strategy pair.
//!
//! The simulation keeps only what the scenarios observe: token balances,
//! vault shares, the two emergency switches, and a clock that accrues a
//! small yield on whatever the strategy holds.

use std::cell::RefCell;
use std::collections::HashMap;

use alloy::primitives::{Address, TxHash, U256};
use orchard_cli::scenarios::{
    basic_shutdown, run_isolated, vault_shutdown_can_withdraw, RelativeTolerance, Scenario,
    ScenarioConfig,
};
use orchard_cli::vault::{NamedAccounts, Result, VaultHarness};
use orchard_cli::ScenarioError;

const USER: Address = Address::new([0x01; 20]);
const GOV: Address = Address::new([0x02; 20]);
const STRATEGIST: Address = Address::new([0x03; 20]);
const VAULT: Address = Address::new([0x10; 20]);
const STRATEGY: Address = Address::new([0x20; 20]);

const DAY: u64 = 86_400;
const PPM: u64 = 1_000_000;

fn amount() -> U256 {
    U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64))
}

fn reverted() -> ScenarioError {
    ScenarioError::Reverted(TxHash::ZERO)
}

#[derive(Debug, Clone, Default)]
struct SimState {
    now: u64,
    block: u64,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    shares: HashMap<Address, U256>,
    total_shares: U256,
    emergency_shutdown: bool,
    emergency_exit: bool,
}

impl SimState {
    fn balance(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    fn move_tokens(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(reverted());
        }
        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance(to);
        self.balances.insert(to, to_balance + amount);
        Ok(())
    }

    fn total_assets(&self) -> U256 {
        self.balance(VAULT) + self.balance(STRATEGY)
    }
}

struct SimHarness {
    accounts: NamedAccounts,
    state: RefCell<SimState>,
    snapshots: RefCell<Vec<SimState>>,
    /// Strategy yield per day, parts per million
    yield_ppm_per_day: u64,
    /// Tokens the strategy fails to return on emergency exit
    exit_dust: U256,
    /// Loss taken on withdrawals, basis points
    withdraw_haircut_bps: u64,
}

impl SimHarness {
    fn new(user_tokens: U256) -> Self {
        let mut state = SimState::default();
        state.balances.insert(USER, user_tokens);
        Self {
            accounts: NamedAccounts {
                user: USER,
                gov: GOV,
                strategist: STRATEGIST,
            },
            state: RefCell::new(state),
            snapshots: RefCell::new(Vec::new()),
            yield_ppm_per_day: 100,
            exit_dust: U256::ZERO,
            withdraw_haircut_bps: 0,
        }
    }

    fn state(&self) -> SimState {
        self.state.borrow().clone()
    }
}

impl VaultHarness for SimHarness {
    fn accounts(&self) -> &NamedAccounts {
        &self.accounts
    }

    fn vault(&self) -> Address {
        VAULT
    }

    fn strategy(&self) -> Address {
        STRATEGY
    }

    async fn token_balance(&self, holder: Address) -> Result<U256> {
        Ok(self.state.borrow().balance(holder))
    }

    async fn token_approve(&self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        self.state
            .borrow_mut()
            .allowances
            .insert((owner, spender), amount);
        Ok(())
    }

    async fn token_transfer(&self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.state.borrow_mut().move_tokens(from, to, amount)
    }

    async fn vault_deposit(&self, from: Address, amount: U256) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.emergency_shutdown {
            return Err(reverted());
        }
        let allowance = state
            .allowances
            .get(&(from, VAULT))
            .copied()
            .unwrap_or_default();
        if allowance < amount {
            return Err(reverted());
        }

        let minted = if state.total_shares.is_zero() {
            amount
        } else {
            amount * state.total_shares / state.total_assets()
        };
        state.move_tokens(from, VAULT, amount)?;
        state.allowances.insert((from, VAULT), allowance - amount);
        let held = state.shares.get(&from).copied().unwrap_or_default();
        state.shares.insert(from, held + minted);
        state.total_shares += minted;
        Ok(())
    }

    async fn vault_shares(&self, holder: Address) -> Result<U256> {
        Ok(self
            .state
            .borrow()
            .shares
            .get(&holder)
            .copied()
            .unwrap_or_default())
    }

    async fn vault_withdraw(
        &self,
        from: Address,
        shares: U256,
        recipient: Address,
        _max_loss_bps: u64,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let held = state.shares.get(&from).copied().unwrap_or_default();
        if shares > held || shares.is_zero() {
            return Err(reverted());
        }

        let value = shares * state.total_assets() / state.total_shares;
        let loss = value * U256::from(self.withdraw_haircut_bps) / U256::from(10_000u64);

        let idle = state.balance(VAULT);
        if idle < value {
            state.move_tokens(STRATEGY, VAULT, value - idle)?;
        }
        state.move_tokens(VAULT, recipient, value - loss)?;
        state.shares.insert(from, held - shares);
        state.total_shares -= shares;
        Ok(())
    }

    async fn set_emergency_shutdown(&self, from: Address, active: bool) -> Result<()> {
        if from != GOV {
            return Err(reverted());
        }
        self.state.borrow_mut().emergency_shutdown = active;
        Ok(())
    }

    async fn harvest(&self, from: Address) -> Result<()> {
        if from != GOV && from != STRATEGIST {
            return Err(reverted());
        }
        let mut state = self.state.borrow_mut();
        if state.emergency_exit || state.emergency_shutdown {
            let held = state.balance(STRATEGY);
            let returned = held.saturating_sub(self.exit_dust);
            state.move_tokens(STRATEGY, VAULT, returned)
        } else {
            let idle = state.balance(VAULT);
            state.move_tokens(VAULT, STRATEGY, idle)
        }
    }

    async fn estimate_total_assets(&self, _from: Address) -> Result<U256> {
        Ok(self.state.borrow().balance(STRATEGY))
    }

    async fn set_emergency_exit(&self, from: Address) -> Result<()> {
        if from != STRATEGIST && from != GOV {
            return Err(reverted());
        }
        self.state.borrow_mut().emergency_exit = true;
        Ok(())
    }

    async fn sleep(&self, seconds: u64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let held = state.balance(STRATEGY);
        let accrued = held * U256::from(self.yield_ppm_per_day) * U256::from(seconds)
            / U256::from(DAY * PPM);
        state.balances.insert(STRATEGY, held + accrued);
        state.now += seconds;
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> Result<()> {
        self.state.borrow_mut().block += blocks;
        Ok(())
    }

    async fn snapshot(&self) -> Result<U256> {
        let mut snapshots = self.snapshots.borrow_mut();
        snapshots.push(self.state());
        Ok(U256::from(snapshots.len() - 1))
    }

    async fn revert(&self, snapshot: U256) -> Result<()> {
        let index = snapshot.to::<usize>();
        let mut snapshots = self.snapshots.borrow_mut();
        if index >= snapshots.len() {
            return Err(reverted());
        }
        let restored = snapshots[index].clone();
        snapshots.truncate(index);
        *self.state.borrow_mut() = restored;
        Ok(())
    }
}

fn config() -> ScenarioConfig {
    ScenarioConfig {
        amount: amount(),
        tolerance: RelativeTolerance::new(1e-3),
    }
}

#[tokio::test]
async fn test_vault_shutdown_can_withdraw() {
    let harness = SimHarness::new(amount());
    vault_shutdown_can_withdraw(&harness, &config()).await.unwrap();

    let state = harness.state();
    assert!(state.emergency_shutdown);
    assert_eq!(state.now, 7 * 3600);
    assert_eq!(state.block, 1);
    assert!(state.shares.get(&USER).copied().unwrap_or_default().is_zero());
    assert!(state.balance(USER) >= amount());
}

#[tokio::test]
async fn test_vault_shutdown_burns_leftover_tokens() {
    let extra = U256::from(5u64) * U256::from(10u64).pow(U256::from(18u64));
    let harness = SimHarness::new(amount() + extra);
    vault_shutdown_can_withdraw(&harness, &config()).await.unwrap();

    let state = harness.state();
    assert_eq!(state.balance(Address::ZERO), extra);
}

#[tokio::test]
async fn test_vault_shutdown_detects_withdraw_loss() {
    let mut harness = SimHarness::new(amount());
    harness.withdraw_haircut_bps = 100;

    let err = vault_shutdown_can_withdraw(&harness, &config())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Check {
            check: "user token balance after withdraw",
            ..
        }
    ));
}

#[tokio::test]
async fn test_basic_shutdown() {
    let harness = SimHarness::new(amount());
    basic_shutdown(&harness, &config()).await.unwrap();

    let state = harness.state();
    assert!(state.emergency_exit);
    assert!(!state.emergency_shutdown);
    assert_eq!(state.balance(STRATEGY), U256::ZERO);
    assert!(state.balance(VAULT) > amount());
    assert_eq!(state.now, DAY + 6 * 3600);
    assert_eq!(state.block, 3);
}

#[tokio::test]
async fn test_basic_shutdown_requires_empty_strategy() {
    let mut harness = SimHarness::new(amount());
    harness.exit_dust = U256::from(1u64);

    let err = basic_shutdown(&harness, &config()).await.unwrap_err();
    match err {
        ScenarioError::Check {
            check,
            expected,
            actual,
        } => {
            assert_eq!(check, "strategy token balance after emergency exit");
            assert_eq!(expected, U256::ZERO);
            assert_eq!(actual, U256::from(1u64));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_tolerance_too_tight_for_yield() {
    let mut harness = SimHarness::new(amount());
    harness.yield_ppm_per_day = 50_000;

    let tight = ScenarioConfig {
        amount: amount(),
        tolerance: RelativeTolerance::new(1e-6),
    };
    assert!(basic_shutdown(&harness, &tight).await.is_err());
}

#[tokio::test]
async fn test_run_isolated_restores_state() {
    let harness = SimHarness::new(amount());
    let before = harness.state();

    for scenario in Scenario::ALL {
        run_isolated(&harness, scenario, &config()).await.unwrap();
        let after = harness.state();
        assert_eq!(after.balance(USER), before.balance(USER));
        assert_eq!(after.balance(VAULT), U256::ZERO);
        assert!(!after.emergency_shutdown);
        assert!(!after.emergency_exit);
        assert_eq!(after.now, 0);
    }
    assert!(harness.snapshots.borrow().is_empty());
}

#[tokio::test]
async fn test_run_isolated_reverts_after_failure() {
    let mut harness = SimHarness::new(amount());
    harness.exit_dust = U256::from(1u64);

    let result = run_isolated(&harness, Scenario::BasicShutdown, &config()).await;
    assert!(result.is_err());

    let state = harness.state();
    assert_eq!(state.balance(USER), amount());
    assert!(!state.emergency_exit);
}
