#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

use orchard_cli::logging::{self, LogLevel};

mod cmd;

#[derive(Parser)]
#[command(name = "orchard")]
#[command(about = "MerkleOrchard reward claims and vault shutdown checks", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease log verbosity (-q warn, -qq error)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "verbose")]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Claim unclaimed distributions listed in local proof files
    Claim(cmd::claim::Cli),
    /// Run emergency-shutdown scenarios against a development node
    Shutdown(cmd::shutdown::Cli),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::try_init(LogLevel::from_flags(cli.verbose, cli.quiet)).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Claim(args) => cmd::claim::run(args).await?,
        Commands::Shutdown(args) => cmd::shutdown::run(args).await?,
    }

    Ok(())
}
