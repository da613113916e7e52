use std::str::FromStr;

use alloy::primitives::U256;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::error;

use orchard_cli::parse_address;
use orchard_cli::scenarios::{self, RelativeTolerance, Scenario, ScenarioConfig};
use orchard_cli::vault::{HarnessConfig, LiveHarness, NamedAccounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Which {
    All,
    Withdraw,
    Basic,
}

impl Which {
    fn scenarios(self) -> Vec<Scenario> {
        match self {
            Which::All => Scenario::ALL.to_vec(),
            Which::Withdraw => vec![Scenario::VaultShutdownCanWithdraw],
            Which::Basic => vec![Scenario::BasicShutdown],
        }
    }
}

#[derive(Args)]
pub struct Cli {
    /// Development node endpoint with unlocked accounts
    #[arg(long, env = "ORCHARD_RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Want token of the vault
    #[arg(long)]
    token: String,

    #[arg(long)]
    vault: String,

    #[arg(long)]
    strategy: String,

    /// Depositor account
    #[arg(long)]
    user: String,

    /// Vault governance, also used as keeper
    #[arg(long)]
    gov: String,

    #[arg(long)]
    strategist: String,

    /// Deposit amount in the token's smallest unit (decimal or 0x hex)
    #[arg(long)]
    amount: String,

    /// Relative tolerance for approximate balance checks
    #[arg(long, default_value_t = 1e-3)]
    rel: f64,

    /// Which scenario to run
    #[arg(long, value_enum, default_value_t = Which::All)]
    scenario: Which,
}

pub async fn run(args: Cli) -> Result<()> {
    let harness_config = HarnessConfig {
        rpc_url: args.rpc_url.clone(),
        token: parse_address(&args.token).context("Invalid token address")?,
        vault: parse_address(&args.vault).context("Invalid vault address")?,
        strategy: parse_address(&args.strategy).context("Invalid strategy address")?,
        accounts: NamedAccounts {
            user: parse_address(&args.user).context("Invalid user address")?,
            gov: parse_address(&args.gov).context("Invalid gov address")?,
            strategist: parse_address(&args.strategist).context("Invalid strategist address")?,
        },
    };
    let config = ScenarioConfig {
        amount: U256::from_str(args.amount.trim())
            .map_err(|e| anyhow::anyhow!("Invalid amount {:?}: {}", args.amount, e))?,
        tolerance: RelativeTolerance::new(args.rel),
    };

    let harness = LiveHarness::connect(harness_config).await?;
    println!(
        "Running shutdown scenarios with amount {} (rel {})",
        config.amount, config.tolerance
    );

    let mut failed = 0;
    for scenario in args.scenario.scenarios() {
        match scenarios::run_isolated(&harness, scenario, &config).await {
            Ok(()) => println!("PASS {}", scenario.name()),
            Err(e) => {
                error!("{} failed: {}", scenario.name(), e);
                println!("FAIL {}: {}", scenario.name(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} scenario(s) failed", failed);
    }
    Ok(())
}
