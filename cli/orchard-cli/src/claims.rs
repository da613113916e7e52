//! The claim loop: proof files in, claim transactions out.
//!
//! For every reward program, each matching proof file is parsed and each of
//! its entries checked against the orchard. Entries already claimed are left
//! alone; everything else is submitted as a single-claim transaction.
//!
//! The claimed check and the submission are separate calls. A concurrent
//! claimant can slip in between; the orchard then reverts the second claim
//! and the error propagates like any other.

use std::path::{Path, PathBuf};

use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, TxHash, B256, U256};
use tracing::{debug, info, warn};

use crate::common::{claim_leaf, compute_root};
use crate::error::Result;
use crate::orchard::{Claim, Orchard};
use crate::proofs::{self, ProofFile, TokenReward};
use crate::rewards::RewardProgram;

/// Decimals assumed when printing claimed amounts.
const DISPLAY_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimOptions {
    /// Perform reads only; never submit
    pub dry_run: bool,
    /// Check each proof against the published root before submitting
    pub verify_proofs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    AlreadyClaimed,
    Submitted(TxHash),
    /// Unclaimed, left alone because of `dry_run`
    WouldClaim,
    /// Proof folds to a different root than the one published
    ProofMismatch { published: B256, computed: B256 },
}

#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub file: PathBuf,
    pub symbol: String,
    pub distribution_id: u64,
    pub claimer: Address,
    pub name: String,
    pub amount: U256,
    pub outcome: ClaimOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ClaimReport {
    pub records: Vec<ClaimRecord>,
    /// Files without a config block
    pub skipped_files: Vec<PathBuf>,
}

impl ClaimReport {
    pub fn submitted(&self) -> usize {
        self.count(|outcome| matches!(outcome, ClaimOutcome::Submitted(_)))
    }

    pub fn already_claimed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ClaimOutcome::AlreadyClaimed))
    }

    pub fn pending(&self) -> usize {
        self.count(|outcome| matches!(outcome, ClaimOutcome::WouldClaim))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|outcome| matches!(outcome, ClaimOutcome::ProofMismatch { .. }))
    }

    fn count(&self, pred: impl Fn(&ClaimOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn print_summary(&self) {
        println!();
        println!("Entries checked: {}", self.records.len());
        println!("  submitted:       {}", self.submitted());
        println!("  already claimed: {}", self.already_claimed());
        if self.pending() > 0 {
            println!("  unclaimed (dry run): {}", self.pending());
        }
        if self.mismatched() > 0 {
            println!("  proof mismatch:  {}", self.mismatched());
        }
        if !self.skipped_files.is_empty() {
            println!("Files without config: {}", self.skipped_files.len());
        }
    }
}

/// Formats a smallest-unit amount as a decimal with trailing zeros removed.
pub fn format_amount(amount: U256) -> String {
    match format_units(amount, DISPLAY_DECIMALS) {
        Ok(formatted) => {
            let trimmed = formatted.trim_end_matches('0');
            if trimmed.ends_with('.') {
                format!("{}0", trimmed)
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => amount.to_string(),
    }
}

/// Human-readable name for `address`, falling back to the address itself.
pub async fn display_name<O: Orchard>(orchard: &O, address: Address) -> String {
    match orchard.token_name(address).await {
        Ok(name) => name,
        Err(e) => {
            debug!("No name for {}: {}", address, e);
            address.to_string()
        }
    }
}

/// Walks every program's proof files under `proofs_dir` and claims what is unclaimed.
pub async fn claim_all<O: Orchard>(
    orchard: &O,
    programs: &[RewardProgram],
    proofs_dir: &Path,
    options: &ClaimOptions,
) -> Result<ClaimReport> {
    let mut report = ClaimReport::default();

    for program in programs {
        let files = proofs::discover(proofs_dir, &program.prefix)?;
        info!(
            "{}: {} proof file(s) matching {:?}",
            program.symbol,
            files.len(),
            program.prefix
        );

        for path in files {
            match proofs::load(&path)? {
                Some(file) => claim_file(orchard, program, &file, options, &mut report).await?,
                None => {
                    debug!("Skipping {:?}: no config block", path);
                    report.skipped_files.push(path);
                }
            }
        }
    }

    Ok(report)
}

async fn claim_file<O: Orchard>(
    orchard: &O,
    program: &RewardProgram,
    file: &ProofFile,
    options: &ClaimOptions,
    report: &mut ClaimReport,
) -> Result<()> {
    let distribution_id = file.config.distribution_id()?;
    println!("Week: {}", file.config.week);
    debug!(
        "{:?}: distribution {} ({} entries)",
        file.path,
        distribution_id,
        file.rewards.len()
    );

    for reward in &file.rewards {
        let name = display_name(orchard, reward.address).await;
        println!("claiming {}", name);

        let outcome =
            claim_entry(orchard, program, distribution_id, reward, &name, options).await?;
        report.records.push(ClaimRecord {
            file: file.path.clone(),
            symbol: program.symbol.clone(),
            distribution_id,
            claimer: reward.address,
            name,
            amount: reward.claim_amount,
            outcome,
        });
    }
    Ok(())
}

async fn claim_entry<O: Orchard>(
    orchard: &O,
    program: &RewardProgram,
    distribution_id: u64,
    reward: &TokenReward,
    name: &str,
    options: &ClaimOptions,
) -> Result<ClaimOutcome> {
    let claimed = orchard
        .is_claimed(
            program.token,
            program.distributor,
            distribution_id,
            reward.address,
        )
        .await?;
    println!("claimed: {}", claimed);
    if claimed {
        return Ok(ClaimOutcome::AlreadyClaimed);
    }

    if options.verify_proofs {
        let published = orchard
            .distribution_root(program.token, program.distributor, distribution_id)
            .await?;
        let computed = compute_root(
            claim_leaf(&reward.address, reward.claim_amount),
            &reward.hex_proof,
        );
        if published != computed {
            warn!(
                "Proof for {} in distribution {} does not match published root {} (computed {})",
                name, distribution_id, published, computed
            );
            return Ok(ClaimOutcome::ProofMismatch {
                published,
                computed,
            });
        }
    }

    if options.dry_run {
        println!(
            "{} would claim {} {}",
            name,
            format_amount(reward.claim_amount),
            program.symbol
        );
        return Ok(ClaimOutcome::WouldClaim);
    }

    let claim = Claim {
        distribution_id,
        balance: reward.claim_amount,
        distributor: program.distributor,
        token_index: 0,
        merkle_proof: reward.hex_proof.clone(),
    };
    let tx_hash = orchard
        .claim_distributions(reward.address, vec![claim], vec![program.token])
        .await?;
    println!(
        "{} claimed {} {}",
        name,
        format_amount(reward.claim_amount),
        program.symbol
    );
    info!("Claim transaction {}", tx_hash);
    Ok(ClaimOutcome::Submitted(tx_hash))
}
