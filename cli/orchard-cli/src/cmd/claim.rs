use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zeroize::Zeroize;

use orchard_cli::account::{self, LoadedAccount};
use orchard_cli::claims::{self, ClaimOptions};
use orchard_cli::orchard::{LiveOrchard, OrchardConfig};
use orchard_cli::rewards::{self, RewardProgram};
use orchard_cli::{expand_path, parse_address};

const GWEI: u128 = 1_000_000_000;

#[derive(Args)]
pub struct Cli {
    /// JSON-RPC endpoint
    #[arg(long, env = "ORCHARD_RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// MerkleOrchard contract address [default: mainnet orchard]
    #[arg(long)]
    orchard: Option<String>,

    /// Directory scanned recursively for proof files
    #[arg(short = 'd', long, default_value = "./scripts")]
    proofs_dir: PathBuf,

    /// JSON file of reward programs, replacing the built-in BAL and LDO programs
    #[arg(long)]
    rewards: Option<PathBuf>,

    /// Directory of encrypted JSON keystores
    #[arg(long, env = "ORCHARD_KEYSTORE_DIR")]
    keystore_dir: Option<PathBuf>,

    /// Keystore account name; prompts when omitted
    #[arg(short, long)]
    account: Option<String>,

    /// Private key (hex format, with or without 0x prefix) instead of a keystore.
    /// Use "-" to read it from stdin
    #[arg(short = 'k', long, conflicts_with = "account")]
    private_key: Option<String>,

    /// Fixed gas price in gwei
    #[arg(long)]
    gas_price_gwei: Option<u64>,

    /// Check claim status and print what would be claimed without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Compare each proof with the published distribution root before claiming
    #[arg(long)]
    verify_proofs: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    let programs = match &args.rewards {
        Some(path) => rewards::load_programs(&expand_path(path))
            .context("Failed to load reward programs")?,
        None => RewardProgram::homestead_defaults(),
    };
    let config = orchard_config(&args)?;
    let options = ClaimOptions {
        dry_run: args.dry_run,
        verify_proofs: args.verify_proofs,
    };
    let proofs_dir = expand_path(&args.proofs_dir);

    let report = if args.dry_run {
        let orchard = LiveOrchard::connect_read_only(config).await?;
        claims::claim_all(&orchard, &programs, &proofs_dir, &options).await?
    } else {
        let account = load_account(&args)?;
        println!("Using account {} ({})", account.name, account.address);
        let orchard = LiveOrchard::connect(config, account.signer).await?;
        claims::claim_all(&orchard, &programs, &proofs_dir, &options).await?
    };

    report.print_summary();
    Ok(())
}

fn orchard_config(args: &Cli) -> Result<OrchardConfig> {
    let mut config = OrchardConfig {
        rpc_url: args.rpc_url.clone(),
        gas_price: args.gas_price_gwei.map(|gwei| u128::from(gwei) * GWEI),
        ..OrchardConfig::default()
    };
    if let Some(orchard) = &args.orchard {
        config.orchard = parse_address(orchard).context("Invalid orchard address")?;
    }
    Ok(config)
}

fn load_account(args: &Cli) -> Result<LoadedAccount> {
    if let Some(key) = &args.private_key {
        let mut key_str = if key == "-" {
            account::read_secret_line(io::stdin().lock())?
        } else {
            key.clone()
        };
        let loaded = account::from_private_key(&key_str);
        key_str.zeroize();
        return loaded;
    }

    let dir = args
        .keystore_dir
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(account::default_keystore_dir);
    let names = account::keystore_names(&dir)?;
    if names.is_empty() {
        anyhow::bail!("No keystores found in {:?}", dir);
    }

    let name = match &args.account {
        Some(name) if names.contains(name) => name.clone(),
        Some(name) => anyhow::bail!(
            "Unknown account {:?}; available: {}",
            name,
            names.join(", ")
        ),
        None => account::prompt_choice("Account", &names, io::stdin().lock(), io::stdout())?,
    };

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut password = account::read_password(
        &format!("Enter password for {:?}: ", name),
        stdin.lock(),
        io::stdout(),
        interactive,
    )?;
    let loaded = account::decrypt_keystore(&dir, &name, &password);
    password.zeroize();
    loaded
}
